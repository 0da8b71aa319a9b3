//! Route definitions

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{api_predict, api_schema, api_status, health, index, predict_form, AppState};

/// Create the router: the form page, its predict action and the JSON API
pub fn app_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Form page
        .route("/", get(index))
        .route("/predict", post(predict_form))
        // JSON API
        .route("/api/predict", post(api_predict))
        .route("/api/schema", get(api_schema))
        .route("/api/status", get(api_status))
}
