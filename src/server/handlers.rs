//! HTTP request handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Form, Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::views::{render_page, Outcome};
use crate::form;
use crate::metrics::{MetricsSnapshot, PredictionMetrics};
use crate::models::loader::StatusMessage;
use crate::models::{InferenceEngine, ModelError, ModelStatus};
use crate::types::employee::EmployeeRecord;
use crate::types::schema::{FieldSpec, FIELDS};

/// Shared application state.
///
/// Built once at startup from the load report and never mutated afterwards,
/// apart from the metrics counters.
pub struct AppState {
    pub status: ModelStatus,
    /// Present only when a predict-capable model is loaded
    pub engine: Option<InferenceEngine>,
    pub metrics: PredictionMetrics,
}

impl AppState {
    pub fn new(status: ModelStatus) -> Self {
        let engine = status
            .model
            .clone()
            .and_then(|model| match InferenceEngine::new(model) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    warn!(error = %e, "Prediction disabled");
                    None
                }
            });

        Self {
            status,
            engine,
            metrics: PredictionMetrics::new(),
        }
    }

    fn predict(&self, record: &EmployeeRecord) -> Result<crate::models::Prediction, PredictError> {
        let engine = self.engine.as_ref().ok_or(PredictError::Unavailable)?;
        match engine.predict(record) {
            Ok(prediction) => {
                self.metrics
                    .record_prediction(&prediction.label, prediction.latency_us);
                info!(
                    prediction_id = %prediction.id,
                    label = %prediction.label,
                    latency_us = prediction.latency_us,
                    "Prediction served"
                );
                Ok(prediction)
            }
            Err(e) => {
                self.metrics.record_failure();
                error!(error = %e, "Prediction failed");
                Err(PredictError::Failed(e))
            }
        }
    }
}

enum PredictError {
    Unavailable,
    Failed(ModelError),
}

impl PredictError {
    fn status(&self) -> StatusCode {
        match self {
            PredictError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Render the form with default values
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(
        &state.status,
        &form::record_values(&EmployeeRecord::default()),
        None,
    ))
}

/// Handle the predict button
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(values): Form<HashMap<String, String>>,
) -> Response {
    let snapshot = match form::collect(&values) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(field = e.field, error = %e.message, "Rejected form input");
            let page = render_page(
                &state.status,
                &form::submitted_values(&values),
                Some(Outcome::Invalid(&e)),
            );
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
        }
    };

    let current = form::record_values(&snapshot);
    match state.predict(&snapshot) {
        Ok(prediction) => {
            let page = render_page(&state.status, &current, Some(Outcome::Prediction(&prediction)));
            (StatusCode::OK, Html(page)).into_response()
        }
        Err(e) => {
            let outcome = match &e {
                PredictError::Unavailable => Outcome::Unavailable,
                PredictError::Failed(err) => Outcome::Failed(err),
            };
            let page = render_page(&state.status, &current, Some(outcome));
            (e.status(), Html(page)).into_response()
        }
    }
}

/// JSON prediction endpoint
pub async fn api_predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmployeeRecord>, JsonRejection>,
) -> Response {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected JSON record");
            let error = ErrorResponse {
                error: rejection.body_text(),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(error)).into_response();
        }
    };

    match state.predict(&record) {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(e) => {
            let message = match &e {
                PredictError::Unavailable => {
                    "Model is not loaded. Please check the file path or loading process."
                        .to_string()
                }
                PredictError::Failed(err) => err.to_string(),
            };
            (e.status(), Json(ErrorResponse { error: message })).into_response()
        }
    }
}

/// Form field table
pub async fn api_schema() -> Json<&'static [FieldSpec]> {
    let fields: &'static [FieldSpec] = &FIELDS;
    Json(fields)
}

/// Model load report and prediction metrics
pub async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        model_path: state.status.path.display().to_string(),
        model_loaded: state.status.model.is_some(),
        can_predict: state.engine.is_some(),
        messages: state.status.messages.clone(),
        metrics: state.metrics.snapshot(),
    })
}

// Response types

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub model_path: String,
    pub model_loaded: bool,
    pub can_predict: bool,
    pub messages: Vec<StatusMessage>,
    pub metrics: MetricsSnapshot,
}
