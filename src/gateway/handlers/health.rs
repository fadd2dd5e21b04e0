//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use super::super::state::AppState;

/// Health check response data
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

/// GET /health
///
/// - Healthy: 200 + `{"status": "ok", "store": "..."}`
/// - Unhealthy: 503 + `{"status": "unavailable", ...}`
///
/// Store errors are logged, never returned.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.store.name();
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse { status: "ok", store }),
        ),
        Err(e) => {
            tracing::error!(store, error = %e, "[HEALTH] Store check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    store,
                }),
            )
        }
    }
}
