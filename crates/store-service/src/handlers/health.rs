//! Greeting and health check handlers.
//!
//! - `/`: greeting text
//! - `/health`: liveness probe, no dependency checks
//! - `/ready`: readiness probe, pings the store

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Greeting served at the root path.
pub const GREETING: &str = "Hello from Music Store!";

/// Handler for GET /
pub async fn root() -> &'static str {
    GREETING
}

/// Liveness probe handler.
///
/// Does NOT check any dependencies; failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 if the store answers a ping, 503 otherwise. The error message
/// is generic; the cause is logged.
#[tracing::instrument(skip_all, name = "store.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.store.ping().await {
        tracing::warn!("Readiness check failed: store error: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("unhealthy"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            error: None,
        }),
    )
}
