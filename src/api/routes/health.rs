//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (an index is serving)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 503 until the first index is built or loaded.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.index.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with index details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.index.snapshot().await;

    let (status, index) = if snapshot.is_some() {
        ("healthy", "ready")
    } else {
        ("degraded", "missing")
    };

    Json(HealthResponse {
        status: status.to_string(),
        index: index.to_string(),
        events: snapshot.as_ref().map_or(0, |i| i.event_count()),
        chunks: snapshot.as_ref().map_or(0, |i| i.chunk_count()),
        built_at: snapshot.as_ref().map(|i| i.built_at()),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
