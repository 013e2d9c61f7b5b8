//! Fractrade executor - Entry Point
//!
//! Connects to the Fractrade executor endpoint and relays ACTION messages to
//! the trading client until SIGINT or SIGTERM.

use anyhow::Result;
use clap::Parser;
use frac_bot::config::load_dotenv;
use frac_bot::{AppConfig, Executor, ShutdownCoordinator};
use tracing::{debug, info, warn};

/// Fractrade executor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FRAC_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (overridden by RUST_LOG, falls back to LOGLEVEL env var)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let dotenv = load_dotenv();
    frac_telemetry::init_logging(args.log_level.as_deref())?;

    info!("Starting Fractrade executor v{}", env!("CARGO_PKG_VERSION"));
    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded .env"),
        Ok(None) => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Failed to load .env"),
    }

    let config = AppConfig::load(args.config.as_deref())?;
    info!(
        ws_url = ?config.ws_url,
        authenticated = config.credentials.is_some(),
        "Configuration loaded"
    );

    let executor = Executor::from_config(&config);
    let (_shutdown, signal_task) = ShutdownCoordinator::install(executor.shutdown_token());

    let result = executor.run().await;
    signal_task.abort();

    result?;
    info!("Goodbye");
    Ok(())
}
