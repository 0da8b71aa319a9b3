//! ML model loading and inference components

pub mod aggregator;
pub mod forest;
pub mod inference;
pub mod loader;
pub mod onnx;

pub use aggregator::VoteAggregator;
pub use inference::{InferenceEngine, Prediction};
pub use loader::{LoadedModel, ModelFormat, ModelLoader, ModelStatus};

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or invoking a model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to deserialize '{}': {reason}", path.display())]
    Deserialize { path: PathBuf, reason: String },

    #[error("unsupported model artifact '{}': {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("model '{0}' does not expose a predict operation")]
    MissingCapability(String),

    #[error("model expects {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<ort::Error> for ModelError {
    fn from(e: ort::Error) -> Self {
        ModelError::Inference(e.to_string())
    }
}

/// Probability assigned to one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    /// Class id, when the model reports one for this column
    pub label: Option<String>,
    pub probability: f64,
}

/// Raw classifier output for a single row
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOutput {
    pub label: String,
    /// Empty when the model does not report probabilities
    pub probabilities: Vec<ClassProbability>,
}

/// The predict capability of a loaded model.
///
/// Implementations receive one encoded row and return exactly one label.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<ClassOutput, ModelError>;
}
