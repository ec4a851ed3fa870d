//! Listing acquisition by scraping the public search-results pages.

pub mod parse;

use adbot_core::{AdRecord, FetchResult, SearchQuery};
use reqwest::header::USER_AGENT;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::error::AcquireError;
use crate::http::{parse_url, HttpClient};
use crate::normalize::normalize_listing;
use crate::pacing::Pacer;

use self::parse::{parse_results_page, parse_seller_name};

/// Generic browser user agent sent with every results-page request.
pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone)]
pub struct ScrapeClient {
    http: HttpClient,
    site: Url,
    user_agent: String,
    pacer: Pacer,
}

impl ScrapeClient {
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidRequest`] if `site_url` is not absolute.
    pub fn new(
        http: HttpClient,
        site_url: &str,
        user_agent: &str,
        pacer: Pacer,
    ) -> Result<Self, AcquireError> {
        Ok(Self {
            http,
            site: parse_url(site_url)?,
            user_agent: user_agent.to_owned(),
            pacer,
        })
    }

    /// Builds `{site}/{location}/{category}?q=kw+kw&p={page}`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidRequest`] if the site URL cannot carry a
    /// path (e.g. a `data:` URL).
    pub fn search_url(
        &self,
        location: &str,
        category: &str,
        keywords: &[String],
        page: usize,
    ) -> Result<Url, AcquireError> {
        let mut url = self.site.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AcquireError::InvalidRequest(format!("site URL '{}' cannot have a path", self.site))
            })?
            .clear()
            .extend(
                [location, category]
                    .iter()
                    .map(|s| s.trim_matches('/'))
                    .filter(|s| !s.is_empty()),
            );
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("q", &keywords.join(" "))
            .append_pair("p", &page.to_string());
        Ok(url)
    }

    /// Scrapes up to `query.page_budget()` result pages, pacing before each
    /// one, and stops as soon as `query.max_results()` listings are collected
    /// or no next page is advertised.
    ///
    /// A failed page ends paging; listings from earlier pages are kept.
    pub async fn fetch_via_scrape(
        &self,
        query: &SearchQuery,
        location: &str,
        category: &str,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let max = query.max_results();
        let mut ads: Vec<AdRecord> = Vec::new();
        let mut failure = None;

        for page in 1..=query.page_budget() {
            let url = match self.search_url(location, category, query.keywords(), page) {
                Ok(url) => url,
                Err(err) => {
                    tracing::error!(error = %err, "cannot build search URL");
                    failure = Some(err.kind());
                    break;
                }
            };
            tracing::info!(page, url = %url, "scraping results page");

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(AcquireError::Cancelled),
                result = self.fetch_page(url) => result,
            };
            let html = match outcome {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(
                        page,
                        kind = %err.kind(),
                        error = %err,
                        collected = ads.len(),
                        "scrape paging stopped"
                    );
                    failure = Some(err.kind());
                    break;
                }
            };

            let parsed = parse_results_page(&html, page);
            tracing::debug!(page, listings = parsed.listings.len(), "results page parsed");
            let room = max.saturating_sub(ads.len());
            ads.extend(
                parsed
                    .listings
                    .into_iter()
                    .take(room)
                    .map(|listing| normalize_listing(listing, &self.site)),
            );

            if ads.len() >= max {
                tracing::info!(max, "reached maximum number of ads");
                break;
            }
            if !parsed.has_next_page {
                tracing::info!(page, "no further result pages");
                break;
            }
        }

        tracing::info!(found = ads.len(), "scrape finished");
        FetchResult::from_accumulated(ads, failure, max)
    }

    /// Reads the seller name from a listing's detail page, pacing before the
    /// request like any other page. `ad_url` may be relative to the site but
    /// must not point at another host.
    ///
    /// # Errors
    ///
    /// - [`AcquireError::InvalidRequest`] if `ad_url` does not resolve to a
    ///   page on the configured site.
    /// - [`AcquireError::Cancelled`] if `cancel` fires first.
    /// - Transport and status failures from the page request.
    pub async fn fetch_seller_name(
        &self,
        ad_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, AcquireError> {
        let url = self.detail_url(ad_url)?;
        let html = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AcquireError::Cancelled),
            result = self.fetch_page(url) => result,
        }?;
        let seller = parse_seller_name(&html);
        if seller.is_none() {
            tracing::debug!(url = %ad_url, "detail page shows no seller name");
        }
        Ok(seller)
    }

    /// Fills `seller` on every ad that lacks one by visiting its detail page.
    ///
    /// Lookups run one at a time. A failed lookup leaves that ad's seller
    /// empty and moves on; cancellation stops the pass and returns the ads
    /// with whatever was filled so far.
    pub async fn enrich_sellers(
        &self,
        mut ads: Vec<AdRecord>,
        cancel: &CancellationToken,
    ) -> Vec<AdRecord> {
        let mut filled = 0usize;
        for ad in ads.iter_mut().filter(|ad| ad.seller.is_none()) {
            match self.fetch_seller_name(&ad.url, cancel).await {
                Ok(Some(name)) => {
                    ad.seller = Some(name);
                    filled += 1;
                }
                Ok(None) => {}
                Err(AcquireError::Cancelled) => {
                    tracing::warn!(filled, "seller lookup cancelled");
                    break;
                }
                Err(err) => {
                    tracing::warn!(url = %ad.url, kind = %err.kind(), error = %err, "seller lookup failed");
                }
            }
        }
        tracing::info!(filled, total = ads.len(), "seller lookup finished");
        ads
    }

    fn detail_url(&self, ad_url: &str) -> Result<Url, AcquireError> {
        let url = self.site.join(ad_url.trim()).map_err(|e| {
            AcquireError::InvalidRequest(format!("invalid listing URL '{ad_url}': {e}"))
        })?;
        if url.origin() != self.site.origin() {
            return Err(AcquireError::InvalidRequest(format!(
                "listing URL '{ad_url}' is not on {}",
                self.site
            )));
        }
        Ok(url)
    }

    async fn fetch_page(&self, url: Url) -> Result<String, AcquireError> {
        self.pacer.pace().await;
        let request = self
            .http
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str());
        let response = self.http.send(request).await?;
        Ok(response.text().await?)
    }
}
