use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub results_log_path: PathBuf,

    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_scope: String,
    pub token_url: String,
    pub token_refresh_buffer_secs: u64,
    pub token_timeout_secs: u64,

    pub search_api_url: String,
    pub sellers_api_url: String,
    pub site_url: String,

    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub pace_min_ms: u64,
    pub pace_max_ms: u64,

    pub api_user_agent: String,
    pub scrape_user_agent: String,
    pub api_per_page: u32,
    pub api_page_budget: usize,
    pub scrape_page_budget: usize,
    pub max_results: usize,
    pub scrape_location: String,
    pub scrape_category: String,
    pub fallback_to_scrape: bool,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
}

impl AppConfig {
    /// Returns the client credential pair when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("results_log_path", &self.results_log_path)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("token_scope", &self.token_scope)
            .field("token_url", &self.token_url)
            .field("token_refresh_buffer_secs", &self.token_refresh_buffer_secs)
            .field("token_timeout_secs", &self.token_timeout_secs)
            .field("search_api_url", &self.search_api_url)
            .field("sellers_api_url", &self.sellers_api_url)
            .field("site_url", &self.site_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("pace_min_ms", &self.pace_min_ms)
            .field("pace_max_ms", &self.pace_max_ms)
            .field("api_user_agent", &self.api_user_agent)
            .field("scrape_user_agent", &self.scrape_user_agent)
            .field("api_per_page", &self.api_per_page)
            .field("api_page_budget", &self.api_page_budget)
            .field("scrape_page_budget", &self.scrape_page_budget)
            .field("max_results", &self.max_results)
            .field("scrape_location", &self.scrape_location)
            .field("scrape_category", &self.scrape_category)
            .field("fallback_to_scrape", &self.fallback_to_scrape)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .finish()
    }
}
