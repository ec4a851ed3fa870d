//! `token` command: verify that the configured credentials are accepted.

use adbot_acquire::{Credentials, HttpClient, HttpSettings, Pacer, TokenManager, TokenSession};
use adbot_core::AppConfig;
use anyhow::Context;

/// Performs one client-credentials exchange and reports the token lifetime.
/// The token itself is never printed.
///
/// # Errors
///
/// Returns an error if credentials are not configured or the exchange fails.
pub(crate) async fn run_token_check(config: &AppConfig) -> anyhow::Result<()> {
    let (client_id, client_secret) = config
        .credentials()
        .context("AVITO_CLIENT_ID and AVITO_CLIENT_SECRET must both be set")?;

    let http = HttpClient::new(&HttpSettings::from_config(config, &config.api_user_agent))?;
    let manager = TokenManager::new(
        http,
        &config.token_url,
        Credentials::new(client_id, client_secret, config.token_scope.as_str()),
        config.token_refresh_buffer_secs,
        config.token_timeout_secs,
        Pacer::disabled(),
    )?;

    let mut session = TokenSession::new();
    manager
        .ensure_valid(&mut session)
        .await
        .context("token exchange failed")?;

    match session.token() {
        Some(token) => println!(
            "token ok for client {client_id}: expires in {}s (obtained {})",
            token.expires_in_secs(),
            token.obtained_at().format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => anyhow::bail!("token exchange returned no token"),
    }
    Ok(())
}
