mod logs;
mod results_log;
mod search;
mod seller;
mod token;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "adbot")]
#[command(about = "Classified-ad acquisition command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one acquisition and append it to the results log
    Search(SearchArgs),
    /// List the preset keywords (usable as `-k <number>`)
    Keywords,
    /// Show the most recent results-log entries
    Logs {
        /// Maximum number of entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Check that the configured credentials can obtain an access token
    Token,
    /// Look up a seller account by id through the API
    Seller {
        /// Seller account id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = adbot_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Search(args)) => {
            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
            search::run_search(&config, &args, &cancel).await?;
        }
        Some(Commands::Keywords) => print_keywords(),
        Some(Commands::Logs { limit }) => logs::run_logs(&config, limit)?,
        Some(Commands::Token) => token::run_token_check(&config).await?,
        Some(Commands::Seller { id }) => {
            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
            seller::run_seller(&config, &id, &cancel).await?;
        }
        None => println!("adbot: run `adbot --help` for available commands"),
    }

    Ok(())
}

fn print_keywords() {
    for (idx, keyword) in adbot_core::KEYWORD_PRESETS.iter().enumerate() {
        println!("{:>2}. {keyword}", idx + 1);
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("received ctrl-c, stopping after the current request");
        cancel.cancel();
    }
}
