use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("AVITO_CLIENT_ID", "client-id");
    m.insert("AVITO_CLIENT_SECRET", "client-secret");
    m
}

#[test]
fn build_app_config_succeeds_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.credentials().is_none());
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
    assert_eq!(cfg.search_api_url, DEFAULT_SEARCH_API_URL);
    assert_eq!(cfg.site_url, DEFAULT_SITE_URL);
    assert_eq!(cfg.token_scope, DEFAULT_TOKEN_SCOPE);
    assert_eq!(cfg.token_refresh_buffer_secs, 300);
    assert_eq!(cfg.token_timeout_secs, 60);
    assert_eq!(cfg.sellers_api_url, DEFAULT_SELLERS_API_URL);
    assert_eq!(cfg.request_timeout_secs, 60);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 2000);
    assert_eq!(cfg.pace_min_ms, 2000);
    assert_eq!(cfg.pace_max_ms, 5000);
    assert_eq!(cfg.api_per_page, 10);
    assert_eq!(cfg.api_page_budget, 1);
    assert_eq!(cfg.scrape_page_budget, 5);
    assert_eq!(cfg.max_results, 10);
    assert_eq!(cfg.scrape_location, "rossiya");
    assert_eq!(cfg.scrape_category, "nedvizhimost");
    assert_eq!(cfg.scrape_user_agent, "Mozilla/5.0");
    assert!(!cfg.fallback_to_scrape);
    assert!(cfg.openai_api_key.is_none());
}

#[test]
fn credentials_require_both_halves() {
    let mut map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.credentials(), Some(("client-id", "client-secret")));

    map.remove("AVITO_CLIENT_SECRET");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.credentials().is_none());
}

#[test]
fn blank_values_are_treated_as_absent() {
    let mut map = full_env();
    map.insert("AVITO_CLIENT_SECRET", "   ");
    map.insert("ADBOT_MAX_RETRIES", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.client_secret.is_none());
    assert_eq!(cfg.max_retries, 3);
}

#[test]
fn debug_redacts_secrets() {
    let mut map = full_env();
    map.insert("OPENAI_API_KEY", "sk-live-123");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("client-secret"), "{rendered}");
    assert!(!rendered.contains("sk-live-123"), "{rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn max_retries_override() {
    let mut map = full_env();
    map.insert("ADBOT_MAX_RETRIES", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_retries, 5);
}

#[test]
fn max_retries_invalid() {
    let mut map = full_env();
    map.insert("ADBOT_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADBOT_MAX_RETRIES"),
        "expected InvalidEnvVar(ADBOT_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn pacing_bounds_must_be_ordered() {
    let mut map = full_env();
    map.insert("ADBOT_PACE_MIN_MS", "6000");
    map.insert("ADBOT_PACE_MAX_MS", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADBOT_PACE_MIN_MS"),
        "expected InvalidEnvVar(ADBOT_PACE_MIN_MS), got: {result:?}"
    );
}

#[test]
fn pacing_bounds_may_be_equal() {
    let mut map = full_env();
    map.insert("ADBOT_PACE_MIN_MS", "0");
    map.insert("ADBOT_PACE_MAX_MS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.pace_min_ms, 0);
    assert_eq!(cfg.pace_max_ms, 0);
}

#[test]
fn max_results_rejects_zero() {
    let mut map = full_env();
    map.insert("ADBOT_MAX_RESULTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADBOT_MAX_RESULTS"),
        "expected InvalidEnvVar(ADBOT_MAX_RESULTS), got: {result:?}"
    );
}

#[test]
fn api_per_page_rejects_zero() {
    let mut map = full_env();
    map.insert("ADBOT_API_PER_PAGE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADBOT_API_PER_PAGE"),
        "expected InvalidEnvVar(ADBOT_API_PER_PAGE), got: {result:?}"
    );
}

#[test]
fn fallback_flag_parses_common_spellings() {
    for (raw, expected) in [("true", true), ("1", true), ("YES", true), ("off", false)] {
        let mut map = full_env();
        map.insert("ADBOT_FALLBACK_TO_SCRAPE", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.fallback_to_scrape, expected, "input {raw}");
    }
}

#[test]
fn fallback_flag_rejects_garbage() {
    let mut map = full_env();
    map.insert("ADBOT_FALLBACK_TO_SCRAPE", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADBOT_FALLBACK_TO_SCRAPE"),
        "expected InvalidEnvVar(ADBOT_FALLBACK_TO_SCRAPE), got: {result:?}"
    );
}

#[test]
fn token_timeout_override() {
    let mut map = full_env();
    map.insert("ADBOT_TOKEN_TIMEOUT_SECS", "5");
    map.insert("ADBOT_REQUEST_TIMEOUT_SECS", "30");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.token_timeout_secs, 5);
    assert_eq!(cfg.request_timeout_secs, 30);
}

#[test]
fn token_timeout_rejects_zero() {
    let mut map = full_env();
    map.insert("ADBOT_TOKEN_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADBOT_TOKEN_TIMEOUT_SECS"),
        "expected InvalidEnvVar(ADBOT_TOKEN_TIMEOUT_SECS), got: {result:?}"
    );
}
