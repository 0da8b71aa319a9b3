//! Employee Performance Predictor Library
//!
//! Serves a form that collects employee attributes, encodes them as a
//! single-row record and asks a pre-trained classifier for a label.

pub mod cli;
pub mod config;
pub mod feature_extractor;
pub mod form;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use models::loader::ModelLoader;
pub use types::employee::EmployeeRecord;
