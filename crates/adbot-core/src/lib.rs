pub mod ads;
pub mod app_config;
pub mod config;
pub mod keywords;
pub mod outcome;
pub mod query;

use thiserror::Error;

pub use ads::{AdRecord, AdSource, UNTITLED};
pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::KEYWORD_PRESETS;
pub use outcome::{EmptyReason, FailureKind, FetchResult};
pub use query::{SearchQuery, Strategy};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    #[error("unknown acquisition strategy: {0}")]
    UnknownStrategy(String),

    #[error("no preset keyword number {0}")]
    UnknownKeywordPreset(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
