//! The normalized ad record shared by both acquisition strategies.
//!
//! ## Field defaults
//!
//! | field         | when the source omits it                          |
//! |---------------|---------------------------------------------------|
//! | `title`       | [`UNTITLED`]                                      |
//! | `description` | `None` (the scrape path never fills it)           |
//! | `price`       | `None`; zero is a real price and is kept as `0`   |
//! | `price_text`  | `None`                                            |
//! | `url`         | resolved by the producer; always absolute         |
//! | `external_id` | `None`                                            |
//! | `seller`      | `None`                                            |

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Title used when a listing carries no usable title.
pub const UNTITLED: &str = "untitled";

/// Which access mode produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdSource {
    Api,
    Scrape,
}

impl fmt::Display for AdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdSource::Api => write!(f, "api"),
            AdSource::Scrape => write!(f, "scrape"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRecord {
    pub title: String,
    /// Only the API exposes listing descriptions.
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// Price exactly as the source displayed it (e.g. `"1 500 000 ₽"`).
    pub price_text: Option<String>,
    /// Absolute detail-page URL.
    pub url: String,
    pub source: AdSource,
    pub external_id: Option<String>,
    pub seller: Option<String>,
}

impl AdRecord {
    /// Text used as input for promotional-message generation: the description
    /// when present and non-blank, otherwise the title.
    #[must_use]
    pub fn annotation_input(&self) -> &str {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.title)
    }
}

/// Returns the trimmed title, or [`UNTITLED`] when it is missing or blank.
#[must_use]
pub fn title_or_untitled(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(|| UNTITLED.to_owned(), str::to_owned)
}
