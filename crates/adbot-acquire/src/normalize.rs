//! Conversion from raw API items and parsed HTML listings to [`AdRecord`].
//!
//! Both paths share the same default policy: a missing title becomes
//! [`adbot_core::UNTITLED`], a missing price stays `None` (never `0`), and the
//! URL is always made absolute against the site origin.

use std::str::FromStr;
use std::sync::LazyLock;

use adbot_core::ads::title_or_untitled;
use adbot_core::{AdRecord, AdSource};
use regex::Regex;
use reqwest::Url;
use rust_decimal::Decimal;

use crate::api::types::RawApiItem;
use crate::scrape::parse::RawListing;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[\d \u{a0}\u{202f}]*(?:[.,]\d{1,2})?").expect("valid price regex")
});

/// Normalizes one item from the search API.
#[must_use]
pub fn normalize_api_item(item: RawApiItem, site: &Url) -> AdRecord {
    let external_id = item.id.as_ref().and_then(json_scalar_to_string);
    let (price, price_text) = match item.price.as_ref() {
        Some(serde_json::Value::Number(n)) => {
            (Decimal::from_str(&n.to_string()).ok(), Some(n.to_string()))
        }
        Some(serde_json::Value::String(s)) => (parse_price(s), non_blank(Some(s.as_str()))),
        _ => (None, None),
    };
    let url = resolve_url(site, item.url.as_deref(), external_id.as_deref());

    AdRecord {
        title: title_or_untitled(item.title.as_deref()),
        description: non_blank(item.description.as_deref()),
        price,
        price_text,
        url,
        source: AdSource::Api,
        external_id,
        seller: None,
    }
}

/// Normalizes one listing card parsed from a search-results page.
#[must_use]
pub fn normalize_listing(listing: RawListing, site: &Url) -> AdRecord {
    let price_text = non_blank(listing.price_text.as_deref());
    let price = listing
        .price_content
        .as_deref()
        .and_then(parse_price)
        .or_else(|| price_text.as_deref().and_then(parse_price));
    let url = resolve_url(site, listing.href.as_deref(), listing.item_id.as_deref());

    AdRecord {
        title: title_or_untitled(listing.title.as_deref()),
        description: None,
        price,
        price_text,
        url,
        source: AdSource::Scrape,
        external_id: non_blank(listing.item_id.as_deref()),
        seller: non_blank(listing.seller.as_deref()),
    }
}

/// Extracts the first number from a displayed price such as `"1 500 000 ₽"`.
///
/// Thin-space and non-breaking-space digit grouping is accepted; a comma is
/// read as the decimal separator. Text with no digits yields `None`.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let m = PRICE_RE.find(text)?;
    let cleaned: String = m
        .as_str()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).ok()
}

/// Resolves `href` against `site`, falling back to `{site}/{id}` and then to
/// the site root. The result is always an absolute http(s) URL.
#[must_use]
pub fn resolve_url(site: &Url, href: Option<&str>, id: Option<&str>) -> String {
    let from_href = href
        .map(str::trim)
        .filter(|h| !h.is_empty() && !h.starts_with('#'))
        .and_then(|h| site.join(h).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"));
    if let Some(url) = from_href {
        return url.to_string();
    }

    if let Some(url) = id
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .and_then(|i| site.join(&format!("/{i}")).ok())
    {
        return url.to_string();
    }

    tracing::debug!(site = %site, "listing has no usable URL; using site root");
    site.join("/").map_or_else(|_| site.to_string(), |u| u.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn json_scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => non_blank(Some(s)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
