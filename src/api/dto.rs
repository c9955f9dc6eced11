//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::rag::{Answer, RebuildReport, Source};
use crate::retrieval::{IntentKind, IntentWindow};

// ============================================
// ASK DTOs
// ============================================

/// Question request
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Free-text question; blank is rejected
    #[serde(default)]
    pub question: String,
}

/// Resolved period of a question
#[derive(Debug, Serialize)]
pub struct IntentDto {
    pub kind: IntentKind,
    /// French label, empty for greetings
    pub display: String,
    /// Window start (ms since epoch)
    pub start_ts: Option<i64>,
    /// Window end (ms since epoch), absent when open-ended
    pub end_ts: Option<i64>,
}

impl From<&IntentWindow> for IntentDto {
    fn from(intent: &IntentWindow) -> Self {
        Self {
            kind: intent.kind,
            display: intent.display.clone(),
            start_ts: intent.bounds.map(|w| w.start),
            end_ts: intent
                .bounds
                .filter(|w| !w.is_open_ended())
                .map(|w| w.end),
        }
    }
}

/// Answer response
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub intent: IntentDto,
    /// Events the answer was grounded on
    pub sources: Vec<Source>,
}

impl From<Answer> for AskResponse {
    fn from(answer: Answer) -> Self {
        Self {
            intent: IntentDto::from(&answer.intent),
            answer: answer.answer,
            sources: answer.sources,
        }
    }
}

// ============================================
// REBUILD DTOs
// ============================================

/// Rebuild response
#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub message: String,
    pub report: RebuildReport,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Welcome message served at `/`
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
}

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" once an index is published, "degraded" before
    pub status: String,
    /// "ready" or "missing"
    pub index: String,
    pub events: usize,
    pub chunks: usize,
    /// Build time of the serving index (ms since epoch)
    pub built_at: Option<i64>,
    pub uptime_seconds: u64,
    pub version: String,
}
