//! Acquisition facade: picks a strategy, runs it, enforces the result cap.

use adbot_core::{AppConfig, EmptyReason, FailureKind, FetchResult, SearchQuery, Strategy};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::error::AcquireError;
use crate::http::{HttpClient, HttpSettings};
use crate::pacing::Pacer;
use crate::scrape::ScrapeClient;
use crate::token::{Credentials, TokenCache, TokenManager, TokenSession};

pub const DEFAULT_LOCATION: &str = "rossiya";
pub const DEFAULT_CATEGORY: &str = "nedvizhimost";

#[derive(Debug, Clone)]
pub struct Acquirer {
    api: Option<ApiClient>,
    scrape: ScrapeClient,
    location: String,
    category: String,
    fallback_to_scrape: bool,
    fallback_page_budget: Option<usize>,
}

impl Acquirer {
    /// `api` is `None` when no credentials are configured; API requests then
    /// report an auth failure.
    #[must_use]
    pub fn new(api: Option<ApiClient>, scrape: ScrapeClient) -> Self {
        Self {
            api,
            scrape,
            location: DEFAULT_LOCATION.to_owned(),
            category: DEFAULT_CATEGORY.to_owned(),
            fallback_to_scrape: false,
            fallback_page_budget: None,
        }
    }

    #[must_use]
    pub fn with_scrape_target(mut self, location: &str, category: &str) -> Self {
        self.location = location.to_owned();
        self.category = category.to_owned();
        self
    }

    /// Enables scraping when the API path fails on auth or response shape.
    /// `page_budget` replaces the query's page budget for the scrape attempt.
    #[must_use]
    pub fn with_fallback_to_scrape(mut self, enabled: bool, page_budget: Option<usize>) -> Self {
        self.fallback_to_scrape = enabled;
        self.fallback_page_budget = page_budget;
        self
    }

    /// Wires every component from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidRequest`] if a configured URL is not
    /// absolute, or [`AcquireError::Transport`] if an HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AcquireError> {
        let pacer = Pacer::from_millis(config.pace_min_ms, config.pace_max_ms);
        let api_http = HttpClient::new(&HttpSettings::from_config(config, &config.api_user_agent))?;
        let scrape_http =
            HttpClient::new(&HttpSettings::from_config(config, &config.scrape_user_agent))?;

        let api = match config.credentials() {
            Some((client_id, client_secret)) => {
                let tokens = TokenManager::new(
                    api_http.clone(),
                    &config.token_url,
                    Credentials::new(client_id, client_secret, config.token_scope.as_str()),
                    config.token_refresh_buffer_secs,
                    config.token_timeout_secs,
                    pacer,
                )?;
                Some(ApiClient::new(
                    api_http,
                    tokens,
                    &config.search_api_url,
                    &config.site_url,
                    config.api_per_page,
                    pacer,
                )?
                .with_sellers_url(&config.sellers_api_url)?)
            }
            None => {
                tracing::warn!("AVITO_CLIENT_ID/AVITO_CLIENT_SECRET not set; API strategy unavailable");
                None
            }
        };

        let scrape = ScrapeClient::new(
            scrape_http,
            &config.site_url,
            &config.scrape_user_agent,
            pacer,
        )?;

        Ok(Self::new(api, scrape)
            .with_scrape_target(&config.scrape_location, &config.scrape_category)
            .with_fallback_to_scrape(config.fallback_to_scrape, Some(config.scrape_page_budget)))
    }

    #[must_use]
    pub fn api(&self) -> Option<&ApiClient> {
        self.api.as_ref()
    }

    #[must_use]
    pub fn scrape(&self) -> &ScrapeClient {
        &self.scrape
    }

    /// Runs one acquisition with the given strategy. The result never holds
    /// more than `query.max_results()` ads.
    pub async fn acquire(
        &self,
        session: &mut TokenSession,
        query: &SearchQuery,
        strategy: Strategy,
        cancel: &CancellationToken,
    ) -> FetchResult {
        tracing::info!(%strategy, keywords = ?query.keywords(), "acquisition started");
        let result = match strategy {
            Strategy::Api => match &self.api {
                Some(api) => api.fetch_via_api(session, query, cancel).await,
                None => no_api_client(),
            },
            Strategy::Scrape => self.run_scrape(query, cancel).await,
        };
        self.finish(strategy, result, query, cancel).await
    }

    /// Same as [`Self::acquire`] but draws API tokens from a shared cache.
    pub async fn acquire_shared(
        &self,
        cache: &TokenCache,
        query: &SearchQuery,
        strategy: Strategy,
        cancel: &CancellationToken,
    ) -> FetchResult {
        tracing::info!(%strategy, keywords = ?query.keywords(), "acquisition started");
        let result = match strategy {
            Strategy::Api => match &self.api {
                Some(api) => api.fetch_with_cache(cache, query, cancel).await,
                None => no_api_client(),
            },
            Strategy::Scrape => self.run_scrape(query, cancel).await,
        };
        self.finish(strategy, result, query, cancel).await
    }

    async fn run_scrape(&self, query: &SearchQuery, cancel: &CancellationToken) -> FetchResult {
        self.scrape
            .fetch_via_scrape(query, &self.location, &self.category, cancel)
            .await
    }

    async fn finish(
        &self,
        strategy: Strategy,
        result: FetchResult,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let result = if strategy == Strategy::Api && self.should_fall_back(&result) {
            tracing::warn!(
                failure = ?result.failure(),
                "API acquisition failed; falling back to scraping"
            );
            let scrape_query = match self.fallback_page_budget {
                Some(budget) => query.with_page_budget(budget),
                None => query.clone(),
            };
            self.run_scrape(&scrape_query, cancel).await
        } else {
            result
        };

        let result = result.capped(query.max_results());
        match &result {
            FetchResult::Found { ads, interrupted } => {
                tracing::info!(found = ads.len(), interrupted = ?interrupted, "acquisition finished");
            }
            FetchResult::Empty { reason } => {
                tracing::info!(?reason, "acquisition finished with no ads");
            }
        }
        result
    }

    fn should_fall_back(&self, result: &FetchResult) -> bool {
        self.fallback_to_scrape
            && matches!(
                result,
                FetchResult::Empty {
                    reason: EmptyReason::Failed(FailureKind::Auth | FailureKind::MalformedResponse)
                }
            )
    }
}

fn no_api_client() -> FetchResult {
    tracing::error!("API strategy requested but no client credentials are configured");
    FetchResult::failed(FailureKind::Auth)
}
