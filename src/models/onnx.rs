//! ONNX Runtime classifier

use crate::models::aggregator::VoteAggregator;
use crate::models::{ClassOutput, ClassProbability, ModelError, Predictor};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier graph exported to ONNX (e.g. from scikit-learn via skl2onnx)
pub struct OnnxClassifier {
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output carrying the predicted class
    label_output: Option<String>,
    /// Output carrying class probabilities
    probability_output: Option<String>,
}

impl OnnxClassifier {
    /// Load a classifier graph from file
    pub fn load(path: &Path, threads: usize) -> Result<Self, ort::Error> {
        info!(path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        info!(
            input = %input_name,
            label_output = ?label_output,
            probability_output = ?probability_output,
            "ONNX session ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        })
    }

    /// Whether the graph produces something a label can be read from
    pub fn has_predict(&self) -> bool {
        self.label_output.is_some() || self.probability_output.is_some()
    }

    /// Read the predicted class from an int64 or string label tensor
    fn extract_label(output: &ort::value::DynValue) -> Result<String, ModelError> {
        let first = match output.try_extract_tensor::<i64>() {
            Ok((_, data)) => data.first().map(|class_id| class_id.to_string()),
            Err(_) => {
                let (_, data) = output.try_extract_strings()?;
                data.into_iter().next()
            }
        };
        first.ok_or_else(|| ModelError::Inference("Empty label output".to_string()))
    }

    /// Read class probabilities from a `[1, n]` tensor or a `seq(map(int64|string, float))`.
    ///
    /// A plain tensor carries no class ids, so its columns stay unlabelled.
    fn extract_probabilities(
        output: &ort::value::DynValue,
    ) -> Result<Vec<ClassProbability>, ModelError> {
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return Ok(data
                .iter()
                .map(|&p| ClassProbability {
                    label: None,
                    probability: p as f64,
                })
                .collect());
        }

        let dtype = output.dtype();
        if !DynSequenceValueType::can_downcast(&dtype) {
            return Err(ModelError::Inference(format!(
                "unsupported probability output type: {:?}",
                dtype
            )));
        }

        let allocator = Allocator::default();
        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| ModelError::Inference(format!("Failed to downcast to sequence: {}", e)))?;
        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        // Batch size is always 1
        let map_value = maps
            .first()
            .ok_or_else(|| ModelError::Inference("Empty probability sequence".to_string()))?;

        let pairs: Vec<(String, f32)> = match map_value.try_extract_key_values::<i64, f32>() {
            Ok(mut kv_pairs) => {
                kv_pairs.sort_by_key(|(class_id, _)| *class_id);
                kv_pairs
                    .into_iter()
                    .map(|(class_id, p)| (class_id.to_string(), p))
                    .collect()
            }
            Err(_) => {
                let mut kv_pairs = map_value.try_extract_key_values::<String, f32>()?;
                kv_pairs.sort_by(|a, b| a.0.cmp(&b.0));
                kv_pairs
            }
        };

        Ok(pairs
            .into_iter()
            .map(|(class_id, p)| ClassProbability {
                label: Some(class_id),
                probability: p as f64,
            })
            .collect())
    }
}

impl Predictor for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<ClassOutput, ModelError> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Inference(format!("Lock error: {}", e)))?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let probabilities = match self
            .probability_output
            .as_deref()
            .and_then(|name| outputs.get(name))
        {
            Some(output) => Self::extract_probabilities(output)?,
            None => Vec::new(),
        };

        let label = match self.label_output.as_deref().and_then(|name| outputs.get(name)) {
            Some(output) => Self::extract_label(output)?,
            None => {
                let values: Vec<f64> = probabilities.iter().map(|p| p.probability).collect();
                let best = VoteAggregator::argmax(&values).ok_or_else(|| {
                    ModelError::Inference("Model produced neither label nor probabilities".to_string())
                })?;
                probabilities[best].label.clone().ok_or_else(|| {
                    ModelError::Inference(
                        "Model has no label output and its probabilities carry no class ids"
                            .to_string(),
                    )
                })?
            }
        };

        debug!(label = %label, classes = probabilities.len(), "ONNX inference complete");

        Ok(ClassOutput {
            label,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FeatureExtractor;
    use crate::models::inference::tests::scenario_record;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
    }

    fn scenario_features() -> Vec<f32> {
        FeatureExtractor::new().extract(&scenario_record())
    }

    fn labels(output: &ClassOutput) -> Vec<Option<&str>> {
        output.probabilities.iter().map(|p| p.label.as_deref()).collect()
    }

    #[test]
    fn test_load_classifier() {
        let classifier = OnnxClassifier::load(&fixture("rf_model.onnx"), 1).unwrap();
        assert!(classifier.has_predict());
        assert_eq!(classifier.input_name, "float_input");
        assert_eq!(classifier.label_output.as_deref(), Some("output_label"));
        assert_eq!(classifier.probability_output.as_deref(), Some("output_probability"));
    }

    #[test]
    fn test_graph_without_classifier_outputs() {
        let classifier = OnnxClassifier::load(&fixture("identity.onnx"), 1).unwrap();
        assert!(!classifier.has_predict());
    }

    #[test]
    fn test_predict_with_class_map() {
        let classifier = OnnxClassifier::load(&fixture("rf_model.onnx"), 1).unwrap();
        let output = classifier.predict(&scenario_features()).unwrap();

        assert_eq!(output.label, "3");
        assert_eq!(labels(&output), vec![Some("2"), Some("3"), Some("4")]);
        assert!((output.probabilities[1].probability - 0.625).abs() < 1e-6);

        let again = classifier.predict(&scenario_features()).unwrap();
        assert_eq!(again, output);
    }

    #[test]
    fn test_predict_with_probability_tensor() {
        let classifier = OnnxClassifier::load(&fixture("rf_model_tensor.onnx"), 1).unwrap();
        let output = classifier.predict(&scenario_features()).unwrap();

        assert_eq!(output.label, "3");
        assert_eq!(labels(&output), vec![None, None, None]);
        assert!((output.probabilities[2].probability - 0.3125).abs() < 1e-6);
    }

    #[test]
    fn test_predict_with_string_classes() {
        let classifier = OnnxClassifier::load(&fixture("rf_model_strings.onnx"), 1).unwrap();
        let output = classifier.predict(&scenario_features()).unwrap();

        assert_eq!(output.label, "Good");
        assert_eq!(
            labels(&output),
            vec![Some("Excellent"), Some("Good"), Some("Outstanding")]
        );
    }

    #[test]
    fn test_label_falls_back_to_best_class() {
        let classifier = OnnxClassifier::load(&fixture("rf_model_proba_only.onnx"), 1).unwrap();
        assert!(classifier.label_output.is_none());

        let output = classifier.predict(&scenario_features()).unwrap();
        assert_eq!(output.label, "3");
    }

    #[test]
    fn test_unlabelled_probabilities_without_label_output() {
        let classifier =
            OnnxClassifier::load(&fixture("rf_model_tensor_proba_only.onnx"), 1).unwrap();
        assert!(classifier.has_predict());

        let err = classifier.predict(&scenario_features()).unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)));
    }
}
