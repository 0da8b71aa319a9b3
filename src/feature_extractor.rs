//! Feature extraction for employee performance model inference.
//!
//! Encodes an [`EmployeeRecord`] into the numeric vector used during model
//! training: numeric columns pass through, categorical columns become the
//! zero-based index of the chosen option.

use crate::types::employee::{EmployeeRecord, FieldValue};
use crate::types::schema::FIELDS;

/// Feature extractor that transforms employee records into model input features.
///
/// Features are produced in the exact column order expected by the models.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from an employee record.
    pub fn extract(&self, record: &EmployeeRecord) -> Vec<f32> {
        record
            .columns()
            .iter()
            .map(|(_, value)| match value {
                FieldValue::Int(v) => *v as f32,
                FieldValue::Choice { index, .. } => *index as f32,
            })
            .collect()
    }

    /// Get the number of features
    pub fn feature_count(&self) -> usize {
        EmployeeRecord::FIELD_COUNT
    }

    /// Get feature names in order
    pub fn feature_names(&self) -> Vec<&'static str> {
        FIELDS.iter().map(|f| f.name).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
