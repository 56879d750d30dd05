//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub model: String,
    pub num_classes: usize,
    /// True when the label file was missing and placeholder names are in use.
    pub degraded_labels: bool,
}

/// Report engine status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "mealscan-ml".to_string(),
        model: state.engine.model_name(),
        num_classes: state.engine.labels().len(),
        degraded_labels: state.engine.labels().is_synthesized(),
    })
}
