//! Outbound HTTP client factory.
//!
//! Every component that talks to the network (token exchange, search API,
//! scraping, text generation) sends through [`HttpClient::send`] so the retry
//! policy is identical everywhere.

use std::time::Duration;

use adbot_core::AppConfig;
use reqwest::{Client, Request, RequestBuilder, Response, Url};

use crate::error::AcquireError;
use crate::retry::{is_retriable_method, retry_with_backoff, RetryPolicy};

/// Construction parameters for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: "adbot/0.1 (listing-acquisition)".to_owned(),
            retry: RetryPolicy::default(),
        }
    }
}

/// A `reqwest::Client` paired with a uniform retry policy.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpSettings {
    /// Settings for one outbound client, with timeout and retry taken from
    /// `config`. Each surface (API, site, text generation) supplies its own
    /// `User-Agent`.
    #[must_use]
    pub fn from_config(config: &AppConfig, user_agent: &str) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: user_agent.to_owned(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_base_ms,
            },
        }
    }
}

impl HttpClient {
    /// Builds a client with the configured timeout, `User-Agent`, and retry
    /// policy. TLS certificates are always verified.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: &HttpSettings) -> Result<Self, AcquireError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            retry: settings.retry,
        })
    }

    #[must_use]
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    #[must_use]
    pub fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url)
    }

    /// Sends a request, retrying on 500/502/503/504 for HEAD, GET, OPTIONS,
    /// and POST. Any other method, or a body that cannot be replayed, gets a
    /// single attempt.
    ///
    /// # Errors
    ///
    /// - [`AcquireError::InvalidRequest`] if the builder cannot produce a request.
    /// - [`AcquireError::Transport`] on timeout, connection, or TLS failure.
    /// - [`AcquireError::HttpStatus`] for a non-2xx status after retries.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, AcquireError> {
        let request = builder
            .build()
            .map_err(|e| AcquireError::InvalidRequest(e.to_string()))?;
        let url = request.url().to_string();
        let method = request.method().clone();

        let policy = if is_retriable_method(&method) && request.try_clone().is_some() {
            self.retry
        } else {
            RetryPolicy::none()
        };

        let client = &self.client;
        let mut original = Some(request);

        retry_with_backoff(policy, || {
            let attempt = original
                .as_ref()
                .and_then(Request::try_clone)
                .or_else(|| original.take());
            let url = url.clone();
            let method = method.clone();
            async move {
                let Some(request) = attempt else {
                    return Err(AcquireError::InvalidRequest(format!(
                        "{method} {url}: request body cannot be replayed"
                    )));
                };
                let response = client.execute(request).await?;
                let status = response.status();
                tracing::debug!(%method, %url, status = status.as_u16(), "response received");
                if status.is_success() {
                    Ok(response)
                } else {
                    Err(AcquireError::HttpStatus {
                        status: status.as_u16(),
                        url,
                    })
                }
            }
        })
        .await
    }
}

/// Parses `raw` as an absolute URL.
///
/// # Errors
///
/// Returns [`AcquireError::InvalidRequest`] if `raw` is not a valid absolute URL.
pub fn parse_url(raw: &str) -> Result<Url, AcquireError> {
    Url::parse(raw).map_err(|e| AcquireError::InvalidRequest(format!("invalid URL '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_retry_defaults() {
        let settings = HttpSettings::default();
        assert_eq!(settings.timeout_secs, 60);
        assert_eq!(settings.retry, RetryPolicy::default());
    }

    #[test]
    fn settings_from_config_carry_timeout_and_retry() {
        let mut config = adbot_core::load_app_config_from_env().unwrap();
        config.request_timeout_secs = 7;
        config.max_retries = 1;
        config.retry_backoff_base_ms = 250;

        let settings = HttpSettings::from_config(&config, "Mozilla/5.0");
        assert_eq!(settings.timeout_secs, 7);
        assert_eq!(settings.user_agent, "Mozilla/5.0");
        assert_eq!(
            settings.retry,
            RetryPolicy {
                max_retries: 1,
                backoff_base_ms: 250,
            }
        );
        assert!(HttpClient::new(&settings).is_ok());
    }

    #[test]
    fn parse_url_rejects_relative() {
        assert!(matches!(
            parse_url("/rossiya/nedvizhimost"),
            Err(AcquireError::InvalidRequest(_))
        ));
        assert!(parse_url("https://www.avito.ru").is_ok());
    }
}
