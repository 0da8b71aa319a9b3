//! Model artifact loader

use crate::models::forest::ForestModel;
use crate::models::onnx::OnnxClassifier;
use crate::models::{ModelError, Predictor};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// First byte of every Python pickle stream (protocol 2+)
const PICKLE_MAGIC: u8 = 0x80;

/// Serialized model format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// ONNX graph run through ONNX Runtime
    Onnx,
    /// JSON document, optionally a tree ensemble
    Json,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Onnx => f.write_str("onnx"),
            ModelFormat::Json => f.write_str("json"),
        }
    }
}

/// A deserialized model artifact.
///
/// Holding a `LoadedModel` does not imply the artifact can predict; check
/// [`LoadedModel::has_predict`].
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// Path the model was loaded from
    pub path: PathBuf,
    pub format: ModelFormat,
    /// Human readable type of the loaded object
    pub type_name: String,
    predictor: Option<Box<dyn Predictor>>,
}

impl LoadedModel {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        format: ModelFormat,
        type_name: impl Into<String>,
        predictor: Option<Box<dyn Predictor>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            format,
            type_name: type_name.into(),
            predictor,
        }
    }

    /// Whether the loaded object exposes a predict operation
    pub fn has_predict(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn predictor(&self) -> Option<&dyn Predictor> {
        self.predictor.as_deref()
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("format", &self.format)
            .field("type_name", &self.type_name)
            .field("has_predict", &self.has_predict())
            .finish()
    }
}

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Error,
}

/// A user-visible line describing the load outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Outcome of the startup load: the model handle, if any, plus the messages
/// shown to the user.
#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub path: PathBuf,
    pub model: Option<Arc<LoadedModel>>,
    pub messages: Vec<StatusMessage>,
}

impl ModelStatus {
    /// A model is loaded and can be invoked
    pub fn can_predict(&self) -> bool {
        self.model.as_ref().is_some_and(|m| m.has_predict())
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == StatusLevel::Error)
    }
}

/// Loader for serialized models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a model, reporting the outcome as user-visible messages.
    ///
    /// Never fails: load errors become messages and leave `model` empty.
    pub fn load_with_report<P: AsRef<Path>>(&self, path: P) -> ModelStatus {
        let path = path.as_ref();
        let mut messages = Vec::new();

        let model = match self.load(path) {
            Ok(model) => {
                messages.push(StatusMessage::info(format!(
                    "Model loaded successfully. Type: {}",
                    model.type_name
                )));
                if model.has_predict() {
                    messages.push(StatusMessage::info("The model exposes a predict operation."));
                } else {
                    warn!(path = %path.display(), "Loaded object has no predict operation");
                    messages.push(StatusMessage::error(format!(
                        "Loaded object is not a valid model. Check '{}'.",
                        path.display()
                    )));
                }
                Some(Arc::new(model))
            }
            Err(ModelError::NotFound { path }) => {
                error!(path = %path.display(), "Model file not found");
                messages.push(StatusMessage::error(format!(
                    "Model file '{}' not found. Please ensure it's in the correct directory. \
                     A scikit-learn rf_model.pkl has to be exported to ONNX (rf_model.onnx) first.",
                    path.display()
                )));
                None
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load model");
                messages.push(StatusMessage::error(format!(
                    "An error occurred while loading the model: {}",
                    e
                )));
                None
            }
        };

        ModelStatus {
            path: path.to_path_buf(),
            model,
            messages,
        }
    }

    /// Load a single model from file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel, ModelError> {
        let path = path.as_ref();
        let format = detect_format(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();

        info!(model = %name, path = %path.display(), format = %format, "Loading model");

        let model = match format {
            ModelFormat::Onnx => self.load_onnx(path, name)?,
            ModelFormat::Json => load_json(path, name)?,
        };

        info!(
            model = %model.name,
            type_name = %model.type_name,
            has_predict = model.has_predict(),
            "Model loaded successfully"
        );

        Ok(model)
    }

    fn load_onnx(&self, path: &Path, name: String) -> Result<LoadedModel, ModelError> {
        let classifier =
            OnnxClassifier::load(path, self.onnx_threads).map_err(|e| ModelError::Deserialize {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let predictor: Option<Box<dyn Predictor>> = if classifier.has_predict() {
            Some(Box::new(classifier))
        } else {
            None
        };

        Ok(LoadedModel::new(
            name,
            path,
            ModelFormat::Onnx,
            "OnnxClassifier",
            predictor,
        ))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found_or(path: &Path, e: io::Error) -> ModelError {
    if e.kind() == io::ErrorKind::NotFound {
        ModelError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        ModelError::Deserialize {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

/// Detect the artifact format from its extension, sniffing content otherwise
pub fn detect_format(path: &Path) -> Result<ModelFormat, ModelError> {
    let mut head = [0u8; 1];
    let read = fs::File::open(path)
        .and_then(|mut file| file.read(&mut head))
        .map_err(|e| not_found_or(path, e))?;

    if read == 1 && head[0] == PICKLE_MAGIC {
        return Err(ModelError::Unsupported {
            path: path.to_path_buf(),
            reason: "Python pickle artifacts cannot be loaded; export the model to ONNX"
                .to_string(),
        });
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "onnx" => Ok(ModelFormat::Onnx),
        "json" => Ok(ModelFormat::Json),
        _ if read == 1 && (head[0] == b'{' || head[0] == b'[') => Ok(ModelFormat::Json),
        _ if read == 0 => Err(ModelError::Deserialize {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        }),
        _ => Ok(ModelFormat::Onnx),
    }
}

/// Load a JSON artifact.
///
/// Documents with a `trees` member must be valid forests; any other JSON value
/// loads as an opaque object without a predict operation.
fn load_json(path: &Path, name: String) -> Result<LoadedModel, ModelError> {
    let content = fs::read_to_string(path).map_err(|e| not_found_or(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ModelError::Deserialize {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let is_forest = value.get("trees").is_some();
    if !is_forest {
        let type_name = match &value {
            serde_json::Value::Object(_) => "json object",
            serde_json::Value::Array(_) => "json array",
            _ => "json scalar",
        };
        return Ok(LoadedModel::new(name, path, ModelFormat::Json, type_name, None));
    }

    let forest = ForestModel::from_json(value)?;
    let type_name = format!(
        "{} ({} trees, {} classes)",
        forest.model_type,
        forest.trees.len(),
        forest.classes.len()
    );

    Ok(LoadedModel::new(
        name,
        path,
        ModelFormat::Json,
        type_name,
        Some(Box::new(forest)),
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::forest::tests::sample_forest_json;
    use std::io::Write;
    use tempfile::TempDir;

    pub(crate) fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    pub(crate) fn write_forest(dir: &TempDir) -> PathBuf {
        write_file(
            dir,
            "rf_model.json",
            sample_forest_json().to_string().as_bytes(),
        )
    }

    #[test]
    fn test_load_forest_has_predict() {
        let dir = TempDir::new().unwrap();
        let path = write_forest(&dir);

        let model = ModelLoader::new().load(&path).unwrap();
        assert!(model.has_predict());
        assert_eq!(model.name, "rf_model");
        assert_eq!(model.format, ModelFormat::Json);
        assert!(model.type_name.starts_with("RandomForestClassifier"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rf_model.onnx");

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
        assert!(err.to_string().contains("rf_model.onnx"));
    }

    #[test]
    fn test_report_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rf_model.onnx");

        let status = ModelLoader::new().load_with_report(&path);
        assert!(status.model.is_none());
        assert!(!status.can_predict());
        assert_eq!(status.messages.len(), 1);
        assert_eq!(status.messages[0].level, StatusLevel::Error);
        assert!(status.messages[0].text.contains("rf_model.onnx"));
        assert!(status.messages[0].text.contains("not found"));
        assert!(status.messages[0].text.contains("rf_model.pkl has to be exported to ONNX"));
    }

    #[test]
    fn test_report_for_valid_model() {
        let dir = TempDir::new().unwrap();
        let path = write_forest(&dir);

        let status = ModelLoader::new().load_with_report(&path);
        assert!(status.can_predict());
        assert!(!status.has_errors());
        assert!(status.messages[0].text.starts_with("Model loaded successfully"));
        assert_eq!(status.messages[1].text, "The model exposes a predict operation.");
    }

    #[test]
    fn test_object_without_predict() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "rf_model.json", br#"{"hello": "world"}"#);

        let status = ModelLoader::new().load_with_report(&path);
        let model = status.model.as_ref().unwrap();
        assert!(!model.has_predict());
        assert!(!status.can_predict());
        assert!(status.messages[1].text.contains("not a valid model"));
    }

    #[test]
    fn test_pickle_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "rf_model.pkl", &[0x80, 0x04, 0x95]);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ModelError::Unsupported { .. }));

        let status = ModelLoader::new().load_with_report(&path);
        assert!(status.model.is_none());
        assert!(status.messages[0]
            .text
            .starts_with("An error occurred while loading the model"));
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
    }

    #[test]
    fn test_report_for_onnx_classifier() {
        let status = ModelLoader::new().load_with_report(fixture("rf_model.onnx"));
        assert!(status.can_predict());
        assert_eq!(
            status.messages[0].text,
            "Model loaded successfully. Type: OnnxClassifier"
        );

        let model = status.model.as_ref().unwrap();
        assert_eq!(model.format, ModelFormat::Onnx);
        assert_eq!(model.name, "rf_model");
    }

    #[test]
    fn test_onnx_graph_without_predict() {
        let status = ModelLoader::new().load_with_report(fixture("identity.onnx"));
        assert!(status.model.is_some());
        assert!(!status.can_predict());
        assert!(status.messages[1].text.contains("not a valid model"));
    }

    #[test]
    fn test_corrupt_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "rf_model.json", b"{not json");
        assert!(matches!(
            ModelLoader::new().load(&path),
            Err(ModelError::Deserialize { .. })
        ));

        let path = write_file(&dir, "broken.json", br#"{"trees": 3}"#);
        assert!(matches!(
            ModelLoader::new().load(&path),
            Err(ModelError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_detect_format_by_content() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "model.bin", br#"{"classes": []}"#);
        assert_eq!(detect_format(&path).unwrap(), ModelFormat::Json);

        let path = write_file(&dir, "empty.bin", b"");
        assert!(detect_format(&path).is_err());
    }
}
