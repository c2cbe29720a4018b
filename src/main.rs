use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use ssw_client::auth::{SqliteTokenStore, TokenStore, UnauthorizedHandler};
use ssw_client::cli;
use ssw_client::config::{CliArgs, Config};
use ssw_client::http_client::ApiClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("API base URL: {}", config.client.base_url);
    tracing::debug!("Token database: {}", config.token_db.display());

    let store: Arc<dyn TokenStore> = Arc::new(SqliteTokenStore::open(&config.token_db)?);

    let on_unauthorized: UnauthorizedHandler = Arc::new(|| {
        eprintln!("Session expired. Run `ssw login` to sign in again.");
    });

    // One client per process so every request shares the refresh slot
    let client = Arc::new(
        ApiClient::new(&config.client, store)?.with_unauthorized_handler(on_unauthorized),
    );

    if let Err(e) = cli::run(args.command, client).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
