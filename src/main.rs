//! Employee Performance Predictor - Main Entry Point
//!
//! Loads the model once, then serves the prediction form over HTTP.

use anyhow::Result;
use clap::Parser;
use employee_performance_predictor::cli::{self, Cli, Commands};
use employee_performance_predictor::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "employee_performance_predictor={},tower_http=info",
            logging.level
        ))
    });

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = Cli::parse().command.unwrap_or_default();

    // Load configuration
    let config = cli::load_config(command.common())?;
    init_logging(&config.logging);

    tracing::info!(
        model = %config.model.path.display(),
        "Starting Employee Performance Predictor"
    );

    match command {
        Commands::Serve { host, port, .. } => cli::serve(config, host, port).await?,
        Commands::Check { .. } => cli::check(&config)?,
        Commands::Predict { record, .. } => cli::predict(&config, &record)?,
    }

    Ok(())
}
