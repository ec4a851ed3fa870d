//! Search API response shapes.
//!
//! ### `resources`
//! The result array. Its absence on a 2xx response is treated as a malformed
//! response rather than an empty result.
//!
//! ### Items
//! Every field is optional. `id` and `price` arrive as numbers on most
//! responses but have been seen as strings, so both are kept as raw JSON
//! values and interpreted during normalization. `url` may be relative to the
//! site origin.
//!
//! ### Sellers
//! The seller endpoint returns one JSON object whose fields depend on the
//! account type. Only `name` is interpreted; the rest is kept as-is.

use serde::Deserialize;

/// One page returned by the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub resources: Option<Vec<serde_json::Value>>,
}

/// A single listing as returned by the search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RawApiItem {
    #[serde(default)]
    pub id: Option<serde_json::Value>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub price: Option<serde_json::Value>,

    #[serde(default)]
    pub url: Option<String>,
}

/// Seller account as returned by the sellers endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerProfile {
    pub id: String,
    pub name: Option<String>,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl SellerProfile {
    #[must_use]
    pub fn from_details(id: &str, details: serde_json::Map<String, serde_json::Value>) -> Self {
        let name = details
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        Self {
            id: id.to_owned(),
            name,
            details,
        }
    }
}
