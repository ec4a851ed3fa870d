use adbot_core::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    /// Timeout, connection, TLS, or body-read failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("token exchange failed: {0}")]
    Auth(String),

    #[error("malformed response from {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl AcquireError {
    /// Maps the error onto the fetch-level failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            AcquireError::Transport(_) | AcquireError::InvalidRequest(_) => FailureKind::Transport,
            AcquireError::HttpStatus { .. } => FailureKind::HttpStatus,
            AcquireError::Auth(_) => FailureKind::Auth,
            AcquireError::Malformed { .. } | AcquireError::Deserialize { .. } => {
                FailureKind::MalformedResponse
            }
            AcquireError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Failure of the text-generation collaborator for a single ad.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("text generation request failed: {0}")]
    Request(#[from] AcquireError),

    #[error("text generation returned no content")]
    EmptyResponse,

    #[error("text generation is not configured: {0}")]
    NotConfigured(String),
}
