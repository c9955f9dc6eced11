//! Ask Routes
//!
//! - POST /api/v1/ask - Answer a question about upcoming events

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{AskRequest, AskResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/ask
///
/// Returns 503 while no index has been built, except for greetings.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::Validation("question cannot be empty".to_string()));
    }

    let answer = state.assistant.ask(question).await?;
    Ok(Json(AskResponse::from(answer)))
}
