//! Authenticated search through the official items API.

pub mod types;

use adbot_core::{AdRecord, FailureKind, FetchResult, SearchQuery};
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::error::AcquireError;
use crate::http::{parse_url, HttpClient};
use crate::normalize::normalize_api_item;
use crate::pacing::Pacer;
use crate::token::{TokenCache, TokenManager, TokenSession};

use self::types::{RawApiItem, SearchPage, SellerProfile};

/// Client for the bearer-authenticated search endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    tokens: TokenManager,
    search_url: Url,
    sellers_url: Url,
    site: Url,
    per_page: u32,
    pacer: Pacer,
}

impl ApiClient {
    /// `site_url` is the public site origin used to make relative item URLs
    /// absolute. The seller endpoint defaults to the `sellers` sibling of
    /// `search_url`; see [`Self::with_sellers_url`].
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidRequest`] if either URL is not absolute.
    pub fn new(
        http: HttpClient,
        tokens: TokenManager,
        search_url: &str,
        site_url: &str,
        per_page: u32,
        pacer: Pacer,
    ) -> Result<Self, AcquireError> {
        let search_url = parse_url(search_url)?;
        // `.../core/v1/items` sits next to `.../core/v1/sellers`.
        let sellers_url = search_url.join("sellers").map_err(|e| {
            AcquireError::InvalidRequest(format!("cannot derive sellers URL from '{search_url}': {e}"))
        })?;
        Ok(Self {
            http,
            tokens,
            search_url,
            sellers_url,
            site: parse_url(site_url)?,
            per_page: per_page.max(1),
            pacer,
        })
    }

    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidRequest`] if `sellers_url` is not absolute.
    pub fn with_sellers_url(mut self, sellers_url: &str) -> Result<Self, AcquireError> {
        self.sellers_url = parse_url(sellers_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    #[must_use]
    pub fn sellers_url(&self) -> &Url {
        &self.sellers_url
    }

    /// Looks up one seller account by id, refreshing the session's token
    /// first if needed. The request is paced like a search page.
    ///
    /// # Errors
    ///
    /// - [`AcquireError::InvalidRequest`] for a blank id.
    /// - [`AcquireError::Cancelled`] if `cancel` fires first.
    /// - [`AcquireError::Malformed`] when the body is not a JSON object.
    /// - Token, transport, and status failures as classified elsewhere.
    pub async fn fetch_seller(
        &self,
        session: &mut TokenSession,
        seller_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SellerProfile, AcquireError> {
        let seller_id = seller_id.trim();
        if seller_id.is_empty() {
            return Err(AcquireError::InvalidRequest("seller id is empty".to_owned()));
        }
        let url = self.seller_url(seller_id)?;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AcquireError::Cancelled),
            result = self.lookup_seller(session, url, seller_id) => result,
        };
        if let Err(err) = &outcome {
            tracing::warn!(seller_id, kind = %err.kind(), error = %err, "seller lookup failed");
        }
        outcome
    }

    async fn lookup_seller(
        &self,
        session: &mut TokenSession,
        url: Url,
        seller_id: &str,
    ) -> Result<SellerProfile, AcquireError> {
        self.tokens.ensure_valid(session).await?;
        let token = session
            .access_token()
            .map(str::to_owned)
            .ok_or_else(|| AcquireError::Auth("no access token after refresh".to_owned()))?;

        self.pacer.pace().await;
        let request = self.http.get(url).bearer_auth(token);
        let response = self.http.send(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let context = format!("seller {seller_id}");
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| AcquireError::Deserialize {
                context: context.clone(),
                source: e,
            })?;
        let serde_json::Value::Object(details) = value else {
            return Err(AcquireError::Malformed {
                context,
                reason: "response is not a JSON object".to_owned(),
            });
        };

        tracing::info!(seller_id, status, "seller profile received");
        Ok(SellerProfile::from_details(seller_id, details))
    }

    fn seller_url(&self, seller_id: &str) -> Result<Url, AcquireError> {
        let mut url = self.sellers_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AcquireError::InvalidRequest(format!(
                    "sellers URL '{}' cannot have a path",
                    self.sellers_url
                ))
            })?
            .pop_if_empty()
            .push(seller_id);
        Ok(url)
    }

    /// Searches using the token held in `session`, refreshing it first if
    /// needed.
    ///
    /// Never fails outright: token problems yield
    /// `Empty(Failed(Auth))`, and a failure after some pages succeeded keeps
    /// those results. Cancellation is honoured during the token exchange as
    /// well as between pages.
    pub async fn fetch_via_api(
        &self,
        session: &mut TokenSession,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let refreshed = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AcquireError::Cancelled),
            result = self.tokens.ensure_valid(session) => result,
        };
        match refreshed {
            Ok(()) => {}
            Err(AcquireError::Cancelled) => {
                tracing::warn!("API search cancelled while obtaining an access token");
                return FetchResult::failed(FailureKind::Cancelled);
            }
            Err(err) => {
                tracing::error!(error = %err, "no usable access token; API search skipped");
                return FetchResult::failed(FailureKind::Auth);
            }
        }
        let Some(token) = session.access_token().map(str::to_owned) else {
            tracing::error!("access token missing after refresh; API search skipped");
            return FetchResult::failed(FailureKind::Auth);
        };
        self.fetch_pages(&token, query, cancel).await
    }

    /// Same as [`Self::fetch_via_api`] but takes the token from a shared
    /// [`TokenCache`].
    pub async fn fetch_with_cache(
        &self,
        cache: &TokenCache,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let token = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AcquireError::Cancelled),
            result = cache.token_for(&self.tokens) => result,
        };
        match token {
            Ok(token) => self.fetch_pages(&token, query, cancel).await,
            Err(AcquireError::Cancelled) => {
                tracing::warn!("API search cancelled while obtaining an access token");
                FetchResult::failed(FailureKind::Cancelled)
            }
            Err(err) => {
                tracing::error!(error = %err, "no usable access token; API search skipped");
                FetchResult::failed(FailureKind::Auth)
            }
        }
    }

    async fn fetch_pages(
        &self,
        token: &str,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let max = query.max_results();
        let mut ads: Vec<AdRecord> = Vec::new();
        let mut failure = None;

        tracing::info!(keywords = ?query.keywords(), max, pages = query.page_budget(), "API search started");

        for page in 1..=query.page_budget() {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(AcquireError::Cancelled),
                result = self.fetch_page(token, query, page) => result,
            };

            match outcome {
                Ok(items) => {
                    let received = items.len();
                    let room = max.saturating_sub(ads.len());
                    ads.extend(items.into_iter().take(room));
                    tracing::debug!(page, received, total = ads.len(), "API page processed");
                    if ads.len() >= max {
                        tracing::info!(max, "reached maximum number of ads");
                        break;
                    }
                    if received == 0 {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        page,
                        kind = %err.kind(),
                        error = %err,
                        collected = ads.len(),
                        "API paging stopped"
                    );
                    failure = Some(err.kind());
                    break;
                }
            }
        }

        tracing::info!(found = ads.len(), "API search finished");
        FetchResult::from_accumulated(ads, failure, max)
    }

    async fn fetch_page(
        &self,
        token: &str,
        query: &SearchQuery,
        page: usize,
    ) -> Result<Vec<AdRecord>, AcquireError> {
        self.pacer.pace().await;

        let params = [
            ("q", query.joined_keywords()),
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];
        let request = self
            .http
            .get(self.search_url.clone())
            .bearer_auth(token)
            .query(&params);

        let response = self.http.send(request).await?;
        let body = response.text().await?;
        let parsed: SearchPage =
            serde_json::from_str(&body).map_err(|e| AcquireError::Deserialize {
                context: format!("search page {page}"),
                source: e,
            })?;

        let Some(resources) = parsed.resources else {
            return Err(AcquireError::Malformed {
                context: format!("search page {page}"),
                reason: "response has no `resources` array".to_owned(),
            });
        };

        let ads = resources
            .into_iter()
            .enumerate()
            .filter_map(|(idx, raw)| match serde_json::from_value::<RawApiItem>(raw) {
                Ok(item) => Some(normalize_api_item(item, &self.site)),
                Err(e) => {
                    tracing::warn!(page, idx, error = %e, "skipping unreadable search item");
                    None
                }
            })
            .collect();
        Ok(ads)
    }
}
