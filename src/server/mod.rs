//! HTTP server for the prediction form
//!
//! Each interaction is an explicit request: `GET /` renders the form and
//! `POST /predict` handles the predict button.

mod handlers;
mod routes;
mod views;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use handlers::AppState;
pub use routes::app_routes;
pub use views::{render_page, Outcome};

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(app_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start(state: Arc<AppState>, config: &ServerConfig) -> Result<()> {
    let app = router(state.clone());

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /             - Prediction form");
    tracing::info!("  POST /predict      - Predict from form input");
    tracing::info!("  POST /api/predict  - Predict from JSON record");
    tracing::info!("  GET  /api/schema   - Form field table");
    tracing::info!("  GET  /api/status   - Model status and metrics");
    tracing::info!("  GET  /health       - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    state.metrics.log_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loader::tests::{write_file, write_forest};
    use crate::models::ModelLoader;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn state_for(path: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState::new(ModelLoader::new().load_with_report(path)))
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, String) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    const SCENARIO: &str = "Age=30&Gender=Male&EmpDepartment=R%26D&OverTime=No\
        &EmpEducationLevel=3&EmpEnvironmentSatisfaction=3&EmpJobInvolvement=3\
        &EmpJobLevel=3&EmpJobSatisfaction=3&EmpRelationshipSatisfaction=3\
        &EmpWorkLifeBalance=3&EmpHourlyRate=10";

    #[tokio::test]
    async fn test_index_renders_form() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&write_forest(&dir));

        let (status, body) = send(&state, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Model loaded successfully"));
        assert!(body.contains("<button type=\"submit\">Predict</button>"));
        assert!(!body.contains("Prediction:"));
    }

    #[tokio::test]
    async fn test_predict_scenario_renders_one_label() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&write_forest(&dir));

        let (status, body) = send(&state, form_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("id=\"prediction\"").count(), 1);
        assert!(body.contains("<p class=\"label\" id=\"prediction\">3</p>"));
        // submitted values are kept in the sidebar
        assert!(body.contains("<option value=\"R&amp;D\" selected>"));

        assert_eq!(state.metrics.snapshot().predictions_served, 1);
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range_age() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&write_forest(&dir));

        let (status, body) = send(&state, form_request("Age=17")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("Invalid input for Age"));
    }

    #[tokio::test]
    async fn test_missing_model_gates_predict() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&dir.path().join("rf_model.onnx"));

        let (status, body) = send(&state, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("rf_model.onnx' not found"));
        assert!(body.contains("<button type=\"submit\" disabled>Predict</button>"));

        let (status, body) = send(&state, form_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.contains("id=\"prediction\""));
    }

    #[tokio::test]
    async fn test_rejected_form_keeps_submitted_values() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&write_forest(&dir));

        let (status, body) = send(
            &state,
            form_request("Age=17&EmpDepartment=Sales&DistanceFromHome=42"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("<option value=\"Sales\" selected>"));
        assert!(body.contains("name=\"DistanceFromHome\" min=\"0\" max=\"100\" step=\"1\" value=\"42\""));
        assert!(body.contains("name=\"Age\" min=\"18\" max=\"65\" step=\"1\" value=\"17\""));
        assert!(!body.contains("id=\"prediction\""));
    }

    #[tokio::test]
    async fn test_model_without_predict_is_gated() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "rf_model.json", br#"{"estimators": []}"#);
        let state = state_for(&path);
        assert!(state.engine.is_none());

        let (status, body) = send(&state, form_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Loaded object is not a valid model."));
    }

    #[tokio::test]
    async fn test_api_predict_json() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&write_forest(&dir));

        let mut record = serde_json::to_value(crate::EmployeeRecord::default()).unwrap();
        record["Age"] = serde_json::json!(50);
        let request = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(record.to_string()))
            .unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        let prediction: serde_json::Value = serde_json::from_str(&body).unwrap();
        // older employee on overtime: (0.3125, 0.3125, 0.375)
        assert_eq!(prediction["label"], "4");
        assert_eq!(prediction["model"], "rf_model");
        assert_eq!(prediction["probabilities"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_api_predict_rejects_out_of_range_json() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&write_forest(&dir));

        let mut record = serde_json::to_value(crate::EmployeeRecord::default()).unwrap();
        record["Age"] = serde_json::json!(17);
        let request = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(record.to_string()))
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("18..=65"));
        assert_eq!(state.metrics.snapshot().predictions_served, 0);
    }

    #[tokio::test]
    async fn test_api_status_and_schema() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&dir.path().join("rf_model.onnx"));

        let (status, body) = send(&state, get("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["model_loaded"], false);
        assert_eq!(json["can_predict"], false);
        assert_eq!(json["messages"][0]["level"], "error");

        let (status, body) = send(&state, get("/api/schema")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 26);
        assert_eq!(json[0]["name"], "Age");
        assert_eq!(json[0]["min"], 18);

        let (status, body) = send(&state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }
}
