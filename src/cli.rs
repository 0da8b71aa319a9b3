//! Command line interface

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::models::loader::StatusLevel;
use crate::models::{InferenceEngine, ModelLoader, ModelStatus};
use crate::server::{self, AppState};
use crate::types::employee::EmployeeRecord;

/// Employee performance prediction form
#[derive(Parser)]
#[command(name = "employee-performance-predictor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Clone)]
pub struct CommonArgs {
    /// Configuration file
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Model artifact path (overrides the configuration file)
    #[arg(long, short)]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the prediction form (default)
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load the model and print the status report
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Predict the label for one record read from a JSON file
    Predict {
        #[command(flatten)]
        common: CommonArgs,

        /// JSON file holding one employee record
        #[arg(long, short)]
        record: PathBuf,
    },
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Serve { common, .. }
            | Commands::Check { common }
            | Commands::Predict { common, .. } => common,
        }
    }
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            common: CommonArgs {
                config: PathBuf::from(DEFAULT_CONFIG_PATH),
                model: None,
            },
            host: None,
            port: None,
        }
    }
}

/// Load configuration and apply command line overrides
pub fn load_config(common: &CommonArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load_from_path(&common.config)
        .with_context(|| format!("Failed to load {}", common.config.display()))?;
    if let Some(model) = &common.model {
        config.model.path = model.clone();
    }
    Ok(config)
}

fn load_model(config: &AppConfig) -> ModelStatus {
    ModelLoader::with_threads(config.model.onnx_threads).load_with_report(&config.model.path)
}

/// Start the HTTP server
pub async fn serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let status = load_model(&config);
    for message in &status.messages {
        match message.level {
            StatusLevel::Info => tracing::info!("{}", message.text),
            StatusLevel::Error => tracing::error!("{}", message.text),
        }
    }

    let state = Arc::new(AppState::new(status));
    server::start(state, &config.server).await
}

/// Print the model status report; fails when prediction is unavailable
pub fn check(config: &AppConfig) -> Result<()> {
    let status = load_model(config);
    for message in &status.messages {
        match message.level {
            StatusLevel::Info => println!("{}", message.text),
            StatusLevel::Error => eprintln!("error: {}", message.text),
        }
    }

    if !status.can_predict() {
        bail!("Model is not loaded. Please check the file path or loading process.");
    }
    Ok(())
}

/// Predict one record and print the label
pub fn predict(config: &AppConfig, record_path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(record_path)
        .with_context(|| format!("Failed to read {}", record_path.display()))?;
    let record: EmployeeRecord = serde_json::from_str(&content)
        .with_context(|| format!("Invalid employee record in {}", record_path.display()))?;

    let status = load_model(config);
    let Some(model) = status.model.clone() else {
        let reason = status
            .messages
            .first()
            .map(|m| m.text.clone())
            .unwrap_or_default();
        bail!("{}", reason);
    };

    let engine = InferenceEngine::new(model)?;
    let prediction = engine.predict(&record)?;
    println!("{}", prediction.label);
    Ok(())
}
