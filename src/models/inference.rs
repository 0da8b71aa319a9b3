//! Prediction invoker for employee records

use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::LoadedModel;
use crate::models::{ClassProbability, ModelError};
use crate::types::employee::EmployeeRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Result of a single prediction
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Unique prediction identifier
    pub id: String,
    /// Predicted label
    pub label: String,
    /// Class probabilities, when the model reports them
    pub probabilities: Vec<ClassProbability>,
    /// Name of the model that produced the label
    pub model: String,
    /// Inference latency in microseconds
    pub latency_us: u64,
    pub timestamp: DateTime<Utc>,
}

/// Runs the loaded model on employee records.
///
/// Construction fails unless the model exposes a predict operation, so a
/// constructed engine can always be invoked.
pub struct InferenceEngine {
    model: Arc<LoadedModel>,
    feature_extractor: FeatureExtractor,
}

impl InferenceEngine {
    /// Create an engine for a loaded model
    pub fn new(model: Arc<LoadedModel>) -> Result<Self, ModelError> {
        if !model.has_predict() {
            return Err(ModelError::MissingCapability(model.name.clone()));
        }

        info!(
            model = %model.name,
            format = %model.format,
            "Inference engine initialized"
        );

        Ok(Self {
            model,
            feature_extractor: FeatureExtractor::new(),
        })
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    /// Predict the label for one record
    pub fn predict(&self, record: &EmployeeRecord) -> Result<Prediction, ModelError> {
        let predictor = self
            .model
            .predictor()
            .ok_or_else(|| ModelError::MissingCapability(self.model.name.clone()))?;

        let start = Instant::now();
        let features = self.feature_extractor.extract(record);

        let output = predictor.predict(&features).map_err(|e| {
            error!(model = %self.model.name, error = %e, "Model inference failed");
            e
        })?;

        let latency_us = start.elapsed().as_micros() as u64;

        debug!(
            model = %self.model.name,
            label = %output.label,
            latency_us = latency_us,
            "Prediction complete"
        );

        Ok(Prediction {
            id: uuid::Uuid::new_v4().to_string(),
            label: output.label,
            probabilities: output.probabilities,
            model: self.model.name.clone(),
            latency_us,
            timestamp: Utc::now(),
        })
    }
}
