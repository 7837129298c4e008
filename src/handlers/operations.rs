use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use tracing::{error, info};

use crate::app::AppState;

/// OPTIONS /api/operations/reloadConfig
pub async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.config.reload() {
        Ok(config) => {
            info!("Configuration reloaded ({:?})", config.environment);
            (StatusCode::OK, Json("Configuration Reloaded"))
        }
        Err(e) => {
            error!("Exception thrown while reloading configuration: {}", e);
            (StatusCode::BAD_REQUEST, Json("Could not reload configuration"))
        }
    }
}

/// GET /health - liveness plus a round trip to the store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repo.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
