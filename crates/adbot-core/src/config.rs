use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_TOKEN_URL: &str = "https://api.avito.ru/token";
pub const DEFAULT_SEARCH_API_URL: &str = "https://api.avito.ru/core/v1/items";
pub const DEFAULT_SELLERS_API_URL: &str = "https://api.avito.ru/core/v1/sellers";
pub const DEFAULT_SITE_URL: &str = "https://www.avito.ru";
pub const DEFAULT_TOKEN_SCOPE: &str = "items:info messenger:read messenger:write seller:read";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_count = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_owned()));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got \"{raw}\""))
            }),
        }
    };

    let log_level = or_default("ADBOT_LOG_LEVEL", "info");
    let results_log_path = PathBuf::from(or_default("ADBOT_RESULTS_LOG", "./adbot-results.jsonl"));

    let client_id = optional("AVITO_CLIENT_ID");
    let client_secret = optional("AVITO_CLIENT_SECRET");
    let token_scope = or_default("ADBOT_TOKEN_SCOPE", DEFAULT_TOKEN_SCOPE);
    let token_url = or_default("ADBOT_TOKEN_URL", DEFAULT_TOKEN_URL);
    let token_refresh_buffer_secs = parse_u64("ADBOT_TOKEN_REFRESH_BUFFER_SECS", "300")?;
    let token_timeout_secs = parse_u64("ADBOT_TOKEN_TIMEOUT_SECS", "60")?;
    if token_timeout_secs == 0 {
        return Err(invalid("ADBOT_TOKEN_TIMEOUT_SECS", "must be at least 1".to_owned()));
    }

    let search_api_url = or_default("ADBOT_SEARCH_API_URL", DEFAULT_SEARCH_API_URL);
    let sellers_api_url = or_default("ADBOT_SELLERS_API_URL", DEFAULT_SELLERS_API_URL);
    let site_url = or_default("ADBOT_SITE_URL", DEFAULT_SITE_URL);

    let request_timeout_secs = parse_u64("ADBOT_REQUEST_TIMEOUT_SECS", "60")?;
    let max_retries = parse_u32("ADBOT_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("ADBOT_RETRY_BACKOFF_BASE_MS", "2000")?;
    let pace_min_ms = parse_u64("ADBOT_PACE_MIN_MS", "2000")?;
    let pace_max_ms = parse_u64("ADBOT_PACE_MAX_MS", "5000")?;
    if pace_min_ms > pace_max_ms {
        return Err(invalid(
            "ADBOT_PACE_MIN_MS",
            format!("{pace_min_ms} exceeds ADBOT_PACE_MAX_MS ({pace_max_ms})"),
        ));
    }

    let api_user_agent = or_default("ADBOT_API_USER_AGENT", "adbot/0.1 (listing-acquisition)");
    let scrape_user_agent = or_default("ADBOT_SCRAPE_USER_AGENT", "Mozilla/5.0");
    let api_per_page = parse_u32("ADBOT_API_PER_PAGE", "10")?;
    if api_per_page == 0 {
        return Err(invalid("ADBOT_API_PER_PAGE", "must be at least 1".to_owned()));
    }
    let api_page_budget = parse_count("ADBOT_API_PAGE_BUDGET", "1")?;
    let scrape_page_budget = parse_count("ADBOT_SCRAPE_PAGE_BUDGET", "5")?;
    let max_results = parse_count("ADBOT_MAX_RESULTS", "10")?;
    let scrape_location = or_default("ADBOT_SCRAPE_LOCATION", "rossiya");
    let scrape_category = or_default("ADBOT_SCRAPE_CATEGORY", "nedvizhimost");
    let fallback_to_scrape = parse_bool("ADBOT_FALLBACK_TO_SCRAPE", false)?;

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_base_url = or_default("ADBOT_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("ADBOT_OPENAI_MODEL", "gpt-4o-mini");

    Ok(AppConfig {
        log_level,
        results_log_path,
        client_id,
        client_secret,
        token_scope,
        token_url,
        token_refresh_buffer_secs,
        token_timeout_secs,
        search_api_url,
        sellers_api_url,
        site_url,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        pace_min_ms,
        pace_max_ms,
        api_user_agent,
        scrape_user_agent,
        api_per_page,
        api_page_budget,
        scrape_page_budget,
        max_results,
        scrape_location,
        scrape_category,
        fallback_to_scrape,
        openai_api_key,
        openai_base_url,
        openai_model,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
