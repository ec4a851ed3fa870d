//! Structural extraction from search-results HTML.
//!
//! Listing cards are located by their `data-marker="item"` attribute. Each
//! field has a list of selectors, current markup first and older variants
//! after it; the first selector that yields a value wins regardless of where
//! its element sits in the card. A miss on any field is not an error, the
//! field is just left empty for normalization to default.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

fn selectors<const N: usize>(css: [&str; N]) -> [Selector; N] {
    css.map(selector)
}

static ITEM: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-marker="item"]"#));
static TITLE: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    selectors([r#"[itemprop="name"]"#, r#"[data-marker="item-title"]"#, "h3"])
});
static PRICE: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    selectors([r#"[itemprop="price"]"#, r#"[data-marker="item-price"]"#])
});
static LINK: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    selectors([r#"a[itemprop="url"][href]"#, r#"a[data-marker="item-title"][href]"#])
});
static SELLER: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    selectors([r#"[data-marker="seller-info/name"]"#, ".seller-info-name"])
});
static PAGINATION: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[data-marker="pagination"], [data-marker="pagination-button"]"#)
});
static PAGINATION_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static NEXT_MARKER: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[data-marker="pagination-button/nextPage"], [data-marker="pagination-button/next"]"#)
});

/// Fields pulled from one listing card, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub title: Option<String>,
    /// Visible price text.
    pub price_text: Option<String>,
    /// Machine-readable price from a `content` attribute.
    pub price_content: Option<String>,
    pub href: Option<String>,
    pub seller: Option<String>,
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsPage {
    pub listings: Vec<RawListing>,
    pub has_next_page: bool,
}

/// Parses one search-results page. `page` is the 1-based number of the page
/// being parsed and is used to recognise a link to the following page.
#[must_use]
pub fn parse_results_page(html: &str, page: usize) -> ResultsPage {
    let document = Html::parse_document(html);

    let listings: Vec<RawListing> = document
        .select(&ITEM)
        .enumerate()
        .map(|(idx, card)| {
            let listing = extract_listing(card);
            log_missing_fields(idx, &listing);
            listing
        })
        .collect();

    ResultsPage {
        listings,
        has_next_page: has_next_page(&document, page + 1),
    }
}

/// Seller name from a listing detail page, `None` when the page shows none.
#[must_use]
pub fn parse_seller_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_match(document.root_element(), &*SELLER, element_text)
}

fn extract_listing(card: ElementRef<'_>) -> RawListing {
    let title = first_match(card, &*TITLE, element_text);

    let price_content = first_match(card, &*PRICE, |el| {
        el.value()
            .attr("content")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
    });
    let price_text = first_match(card, &*PRICE, element_text);

    let href = first_match(card, &*LINK, |a| a.value().attr("href").map(str::to_owned));

    let seller = first_match(card, &*SELLER, element_text);

    let item_id = card
        .value()
        .attr("data-item-id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned);

    RawListing {
        title,
        price_text,
        price_content,
        href,
        seller,
        item_id,
    }
}

/// Tries `selectors` in order and returns the first value `extract` yields.
fn first_match<T>(
    scope: ElementRef<'_>,
    selectors: &[Selector],
    extract: impl Fn(ElementRef<'_>) -> Option<T>,
) -> Option<T> {
    selectors
        .iter()
        .find_map(|sel| scope.select(sel).find_map(&extract))
}

/// Collapsed, trimmed text content; `None` when empty.
fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn has_next_page(document: &Html, next: usize) -> bool {
    document.select(&PAGINATION).any(|region| {
        region.select(&NEXT_MARKER).next().is_some()
            || region
                .select(&PAGINATION_LINK)
                .filter_map(|a| a.value().attr("href"))
                .any(|href| href_targets_page(href, next))
    })
}

/// `true` if `href` carries a `p=<page>` query parameter.
fn href_targets_page(href: &str, page: usize) -> bool {
    let Some((_, query)) = href.split_once('?') else {
        return false;
    };
    let wanted = page.to_string();
    query
        .split(['&', '#'])
        .filter_map(|pair| pair.split_once('='))
        .any(|(k, v)| k == "p" && v == wanted)
}

fn log_missing_fields(idx: usize, listing: &RawListing) {
    let mut missing = Vec::new();
    if listing.title.is_none() {
        missing.push("title");
    }
    if listing.price_text.is_none() && listing.price_content.is_none() {
        missing.push("price");
    }
    if listing.href.is_none() {
        missing.push("url");
    }
    if !missing.is_empty() {
        tracing::debug!(idx, ?missing, "listing fields not found; defaults will apply");
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
