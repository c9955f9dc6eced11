//! Rebuild Routes
//!
//! - POST /api/v1/rebuild - Refetch the agenda and swap in a new index

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RebuildResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/rebuild
///
/// Waits for the rebuild to finish. On failure the previous index keeps serving.
pub async fn rebuild(State(state): State<Arc<AppState>>) -> ApiResult<Json<RebuildResponse>> {
    let report = state.rebuilder.rebuild().await?;

    Ok(Json(RebuildResponse {
        message: format!(
            "Index reconstruit avec succès : {} événements, {} fragments.",
            report.events, report.chunks
        ),
        report,
    }))
}
