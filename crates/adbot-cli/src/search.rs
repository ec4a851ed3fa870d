//! `search` command: one acquisition, optional annotation, log entry.

use adbot_acquire::{annotate_ads, Acquirer, AnnotatedAd, OpenAiPromoGenerator, TokenSession};
use adbot_core::keywords::resolve_keyword;
use adbot_core::{AdRecord, AppConfig, FetchResult, SearchQuery, Strategy};
use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::results_log::{self, LogEntry};

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// Access mode: `api` or `scrape`
    #[arg(long, default_value = "api")]
    pub method: Strategy,
    /// Keyword or preset number (see `adbot keywords`); repeatable
    #[arg(short = 'k', long = "keyword", required = true)]
    pub keywords: Vec<String>,
    /// Maximum number of ads to return
    #[arg(long)]
    pub max_ads: Option<usize>,
    /// Maximum number of result pages to request
    #[arg(long)]
    pub pages: Option<usize>,
    /// Region path segment for scraping (e.g. moskva)
    #[arg(long)]
    pub location: Option<String>,
    /// Category path segment for scraping
    #[arg(long)]
    pub category: Option<String>,
    /// Generate promotional text for each ad
    #[arg(long)]
    pub annotate: bool,
    /// Visit each ad's page to fill in missing seller names
    #[arg(long)]
    pub sellers: bool,
}

impl SearchArgs {
    /// Turns CLI input into a validated query, filling gaps from config.
    pub(crate) fn to_query(&self, config: &AppConfig) -> anyhow::Result<SearchQuery> {
        let keywords = self
            .keywords
            .iter()
            .map(|k| {
                resolve_keyword(k)
                    .with_context(|| format!("invalid keyword `{k}`; run `adbot keywords` for presets"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let default_pages = match self.method {
            Strategy::Api => config.api_page_budget,
            Strategy::Scrape => config.scrape_page_budget,
        };
        let query = SearchQuery::new(
            keywords,
            self.max_ads.unwrap_or(config.max_results),
            self.pages.unwrap_or(default_pages),
        )?;
        Ok(query)
    }
}

/// Runs one acquisition and records it.
///
/// # Errors
///
/// Returns an error if the query is invalid, the clients cannot be built, or
/// the results log cannot be written. Fetch failures are reported in the
/// output and the log, not as errors.
pub(crate) async fn run_search(
    config: &AppConfig,
    args: &SearchArgs,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let query = args.to_query(config)?;

    let mut acquirer = Acquirer::from_config(config).context("failed to build acquisition clients")?;
    if args.location.is_some() || args.category.is_some() {
        acquirer = acquirer.with_scrape_target(
            args.location.as_deref().unwrap_or(&config.scrape_location),
            args.category.as_deref().unwrap_or(&config.scrape_category),
        );
    }

    let mut session = TokenSession::new();
    let mut result = acquirer.acquire(&mut session, &query, args.method, cancel).await;
    if args.sellers {
        if let FetchResult::Found { ads, .. } = &mut result {
            let found = std::mem::take(ads);
            *ads = acquirer.scrape().enrich_sellers(found, cancel).await;
        }
    }
    print_result(&result);

    let mut entry = LogEntry::new(query.keywords(), args.method, &result);
    if args.annotate && !result.is_empty() {
        match OpenAiPromoGenerator::from_config(config) {
            Ok(generator) => {
                let annotated = annotate_ads(result.ads().to_vec(), &generator).await;
                print_annotations(&annotated);
                entry = entry.with_annotations(&annotated);
            }
            Err(err) => {
                tracing::warn!(error = %err, "promo generation unavailable; ads logged without promos");
            }
        }
    }

    results_log::append(&config.results_log_path, &entry)?;
    tracing::info!(path = %config.results_log_path.display(), "results logged");
    Ok(())
}

fn print_result(result: &FetchResult) {
    match result {
        FetchResult::Found { ads, interrupted } => {
            print_ads(ads);
            if let Some(kind) = interrupted {
                println!();
                println!("note: paging stopped early ({kind}); results are partial");
            }
        }
        FetchResult::Empty { reason } => match reason {
            adbot_core::EmptyReason::NoMatch => println!("no ads matched"),
            adbot_core::EmptyReason::Failed(kind) => println!("acquisition failed: {kind}"),
        },
    }
}

fn print_ads(ads: &[AdRecord]) {
    let header = format!(
        "{:<4}{:<8}{:<20}{:<42}{:<24}URL",
        "#", "SOURCE", "PRICE", "TITLE", "SELLER"
    );
    println!("{header}");
    for (idx, ad) in ads.iter().enumerate() {
        println!(
            "{:<4}{:<8}{:<20}{:<42}{:<24}{}",
            idx + 1,
            ad.source,
            price_display(ad),
            truncate(&ad.title, 40),
            ad.seller.as_deref().map_or_else(|| "-".to_owned(), |s| truncate(s, 22)),
            ad.url
        );
    }
}

fn print_annotations(annotated: &[AnnotatedAd]) {
    println!();
    for (idx, item) in annotated.iter().enumerate() {
        match &item.promo {
            Some(promo) => println!("{}. {promo}", idx + 1),
            None => println!("{}. (no promo generated)", idx + 1),
        }
    }
}

fn price_display(ad: &AdRecord) -> String {
    ad.price_text
        .clone()
        .or_else(|| ad.price.map(|p| p.to_string()))
        .map_or_else(|| "-".to_owned(), |p| truncate(&p, 18))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars.saturating_sub(3)).collect::<String>())
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(keywords: &[&str]) -> SearchArgs {
        SearchArgs {
            method: Strategy::Scrape,
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
            max_ads: Some(3),
            pages: None,
            location: None,
            category: None,
            annotate: false,
            sellers: false,
        }
    }

    #[test]
    fn to_query_resolves_presets() {
        let config = adbot_core::load_app_config_from_env().unwrap();
        let query = search_args(&["1", "Склад"]).to_query(&config).unwrap();
        assert_eq!(query.keywords(), ["Аренда офиса".to_owned(), "Склад".to_owned()]);
        assert_eq!(query.max_results(), 3);
    }

    #[test]
    fn to_query_rejects_unknown_preset() {
        let config = adbot_core::load_app_config_from_env().unwrap();
        let err = search_args(&["42"]).to_query(&config).unwrap_err();
        let core = err
            .downcast_ref::<adbot_core::CoreError>()
            .expect("keyword error should be preserved");
        assert!(matches!(core, adbot_core::CoreError::UnknownKeywordPreset(bad) if bad == "42"));
        assert!(format!("{err:#}").contains("no preset keyword number 42"), "{err:#}");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Офис", 10), "Офис");
        assert_eq!(truncate("Коммерческая недвижимость", 10), "Коммерч...");
    }

    #[test]
    fn price_display_falls_back_to_dash() {
        let ad: AdRecord = serde_json::from_value(serde_json::json!({
            "title": "x",
            "description": null,
            "price": "1500000",
            "price_text": "1 500 000 ₽",
            "url": "https://www.avito.ru/x",
            "source": "api",
            "external_id": null,
            "seller": null
        }))
        .unwrap();
        assert_eq!(price_display(&ad), "1 500 000 ₽");

        let numeric_only = AdRecord {
            price_text: None,
            ..ad.clone()
        };
        assert_eq!(price_display(&numeric_only), "1500000");

        let bare = AdRecord {
            price: None,
            price_text: None,
            ..ad
        };
        assert_eq!(price_display(&bare), "-");
    }
}
