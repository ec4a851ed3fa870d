//! Promotional text generation for acquired ads.
//!
//! Generation runs per ad and may fail per ad; a failure leaves that ad
//! without a promo and never aborts the batch.

use adbot_core::{AdRecord, AppConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{AcquireError, AnnotationError};
use crate::http::{parse_url, HttpClient, HttpSettings};

const PROMPT_PREFIX: &str = "Сгенерируй рекламное сообщение на основе этого объявления: ";
const PROMPT_SUFFIX: &str = ". Реклама должна предлагать маркетинговые услуги, которые помогут продать или сдать это имущество быстрее.";

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

/// Builds the generation prompt for one ad description.
#[must_use]
pub fn promo_prompt(description: &str) -> String {
    format!("{PROMPT_PREFIX}{}{PROMPT_SUFFIX}", description.trim())
}

#[async_trait]
pub trait PromoGenerator: Send + Sync {
    /// Produces promotional text for one ad description.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError`] when the backend fails or returns nothing.
    async fn generate_promo_text(&self, description: &str) -> Result<String, AnnotationError>;
}

/// An ad paired with its generated promo, if generation succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedAd {
    pub ad: AdRecord,
    pub promo: Option<String>,
}

/// Annotates ads one at a time, in order.
pub async fn annotate_ads(ads: Vec<AdRecord>, generator: &dyn PromoGenerator) -> Vec<AnnotatedAd> {
    let mut annotated = Vec::with_capacity(ads.len());
    for (idx, ad) in ads.into_iter().enumerate() {
        let promo = match generator.generate_promo_text(ad.annotation_input()).await {
            Ok(text) => {
                tracing::debug!(idx, url = %ad.url, "promo generated");
                Some(text)
            }
            Err(err) => {
                tracing::warn!(idx, url = %ad.url, error = %err, "promo generation failed; ad left unannotated");
                None
            }
        };
        annotated.push(AnnotatedAd { ad, promo });
    }
    annotated
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`PromoGenerator`] backed by an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiPromoGenerator {
    http: HttpClient,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiPromoGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiPromoGenerator")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiPromoGenerator {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError::NotConfigured`] if the key is blank, or
    /// [`AnnotationError::Request`] if `base_url` is not absolute.
    pub fn new(
        http: HttpClient,
        base_url: &str,
        api_key: &str,
        model: &str,
    ) -> Result<Self, AnnotationError> {
        if api_key.trim().is_empty() {
            return Err(AnnotationError::NotConfigured("API key is empty".to_owned()));
        }
        let endpoint = parse_url(&format!("{}/chat/completions", base_url.trim_end_matches('/')))?;
        Ok(Self {
            http,
            endpoint,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        })
    }

    /// # Errors
    ///
    /// Returns [`AnnotationError::NotConfigured`] when `OPENAI_API_KEY` is
    /// unset, or [`AnnotationError::Request`] if the client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnnotationError> {
        let Some(api_key) = config.openai_api_key.as_deref() else {
            return Err(AnnotationError::NotConfigured(
                "OPENAI_API_KEY is not set".to_owned(),
            ));
        };
        let http = HttpClient::new(&HttpSettings::from_config(config, &config.api_user_agent))?;
        Self::new(http, &config.openai_base_url, api_key, &config.openai_model)
    }
}

#[async_trait]
impl PromoGenerator for OpenAiPromoGenerator {
    async fn generate_promo_text(&self, description: &str) -> Result<String, AnnotationError> {
        let prompt = promo_prompt(description);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let request = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);

        let start = std::time::Instant::now();
        let response = self.http.send(request).await?;
        let text = response.text().await.map_err(AcquireError::from)?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AcquireError::Deserialize {
                context: "chat completion".to_owned(),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .ok_or(AnnotationError::EmptyResponse)?;

        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            "chat completion"
        );
        Ok(content)
    }
}
