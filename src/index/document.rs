//! Documents stored in and returned by the semantic index

use serde::{Deserialize, Serialize};

use crate::catalog::NormalizedEvent;
use crate::time::Timestamp;

/// Event metadata carried by every chunk of that event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    /// Begin and end instants of every valid session
    pub sessions: Vec<Timestamp>,
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    /// Grounding text handed to the generator
    pub full_context: String,
}

impl From<&NormalizedEvent> for EventMetadata {
    fn from(event: &NormalizedEvent) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            url: event.url.clone(),
            sessions: event.sessions.clone(),
            start_ts: event.start_ts,
            end_ts: event.end_ts,
            full_context: event.full_context.clone(),
        }
    }
}

/// A search hit: one chunk of an event's `search_text` plus the event's metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateDocument {
    pub text: String,
    pub metadata: EventMetadata,
    /// Cosine similarity with the query
    pub score: f64,
}

impl CandidateDocument {
    pub fn new(text: impl Into<String>, metadata: EventMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
            score: 0.0,
        }
    }

    pub fn from_event(event: &NormalizedEvent) -> Self {
        Self::new(event.search_text.clone(), EventMetadata::from(event))
    }
}
