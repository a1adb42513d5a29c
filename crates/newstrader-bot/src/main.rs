//! News trader - Entry Point
//!
//! Replays a JSON-lines market feed (file or stdin) through the controller
//! against the in-memory paper venue.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use newstrader_bot::{AppConfig, FeedRunner};
use newstrader_telemetry::{init_logging, LoggingConfig};

/// News-event trade lifecycle controller
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via NEWSTRADER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON-lines market feed; reads stdin when omitted
    #[arg(short, long)]
    feed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&LoggingConfig::from_env())?;

    info!("Starting news trader v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > NEWSTRADER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("NEWSTRADER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::from_file(&config_path)?;
    info!(label = %config.label(), "Configuration loaded");

    let runner = FeedRunner::new(&config)?;

    let summary = match args.feed {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open feed {}", path.display()))?;
            runner.run(BufReader::new(file)).await?
        }
        None => runner.run(BufReader::new(tokio::io::stdin())).await?,
    };

    info!(?summary, "Done");
    Ok(())
}
