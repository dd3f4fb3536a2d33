//! api-data-export binary.
//!
//! Run with: `api-data-export --config export.json --output combined_data.csv`
//!
//! The auth token is read from `--token` or `API_DATA_EXPORT_TOKEN` (a `.env` file
//! in the working directory is honoured).

use anyhow::{Context, Result};
use api_data_export::{Config, ExportPipeline};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Export API inventory and sensitive-parameter data to CSV.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GraphQL endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Value for the Authorization header
    #[arg(long, env = "API_DATA_EXPORT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output CSV file (appended to if it exists)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Entities per batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Start of the observation window (RFC 3339)
    #[arg(long)]
    start_time: Option<DateTime<Utc>>,

    /// End of the observation window (RFC 3339)
    #[arg(long)]
    end_time: Option<DateTime<Utc>>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(endpoint) = self.endpoint {
            config.endpoint.url = endpoint;
        }
        if let Some(token) = self.token {
            config.endpoint.auth_token = Some(token);
        }
        if let Some(output) = self.output {
            config.export.output_path = output;
        }
        if let Some(batch_size) = self.batch_size {
            config.export.batch_size = batch_size;
        }
        config.query.set_window(self.start_time, self.end_time);
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => Config::default(),
    };
    let config = args.apply(config);

    if config.endpoint.auth_token.is_none() {
        info!("No auth token configured; requests are sent without Authorization");
    }
    info!(
        endpoint = %config.endpoint.url,
        output = %config.export.output_path.display(),
        batch_size = config.export.batch_size,
        "Starting export"
    );

    let pipeline = ExportPipeline::from_config(config).context("Invalid configuration")?;
    match pipeline.run().await {
        Ok(summary) => {
            info!(
                entities = summary.total_entities,
                rows = summary.rows_written,
                failed_lookups = summary.failed_lookups,
                "Export complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(code = e.error_code(), error = %e, "Export failed");
            Err(e).context("Export failed")
        }
    }
}
