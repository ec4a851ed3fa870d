//! `seller` command: look up one seller account through the API.

use adbot_acquire::{Acquirer, TokenSession};
use adbot_core::AppConfig;
use anyhow::Context;
use tokio_util::sync::CancellationToken;

/// # Errors
///
/// Returns an error if credentials are not configured or the lookup fails.
pub(crate) async fn run_seller(
    config: &AppConfig,
    seller_id: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let acquirer = Acquirer::from_config(config).context("failed to build acquisition clients")?;
    let api = acquirer
        .api()
        .context("AVITO_CLIENT_ID and AVITO_CLIENT_SECRET must both be set")?;

    let mut session = TokenSession::new();
    let profile = api
        .fetch_seller(&mut session, seller_id, cancel)
        .await
        .with_context(|| format!("seller lookup for {seller_id} failed"))?;

    println!("seller {}: {}", profile.id, profile.name.as_deref().unwrap_or("(no name)"));
    println!("{}", serde_json::to_string_pretty(&profile.details)?);
    Ok(())
}
