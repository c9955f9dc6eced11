//! Context Filter & Assembler
//!
//! Turns the raw similarity hits for a question into the single context
//! string handed to the generator:
//!
//! 1. greeting: nothing is kept and the context is empty
//! 2. temporal filter on the event's session instants
//! 3. deduplication, first occurrence wins
//! 4. join `full_context` blocks, or the "nothing found" sentinel

use std::collections::HashSet;

use crate::index::{CandidateDocument, EventMetadata};
use crate::retrieval::intent::IntentWindow;
use crate::time::TimeWindow;

/// Separator between event blocks in the assembled context
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Period named in the sentinel when the window has no label
pub const GENERIC_PERIOD: &str = "la période demandée";

/// Identity used to collapse several hits into one context block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Canonical URL of the event
    Url(String),
    /// Exact grounding text, for events without a URL
    Content(String),
}

impl DedupKey {
    pub fn of(document: &CandidateDocument) -> Self {
        match document.metadata.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => DedupKey::Url(url.to_string()),
            _ => DedupKey::Content(document.metadata.full_context.clone()),
        }
    }
}

/// Documents retained for a question and the context built from them
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub documents: Vec<CandidateDocument>,
    pub text: String,
}

impl AssembledContext {
    /// Whether the context is the "nothing found" sentinel
    pub fn is_empty_result(&self) -> bool {
        self.documents.is_empty() && !self.text.is_empty()
    }
}

/// "Aucun événement trouvé pour samedi 27/12 et dimanche 28/12."
pub fn no_events_sentinel(display: &str) -> String {
    let period = if display.trim().is_empty() {
        GENERIC_PERIOD
    } else {
        display
    };
    format!("Aucun événement trouvé pour {period}.")
}

/// Whether an event falls in `window`
///
/// Any begin or end instant inside the window is enough. Events without a
/// parsable session are matched on their aggregate bounds instead.
pub fn matches_window(metadata: &EventMetadata, window: &TimeWindow) -> bool {
    if metadata.sessions.is_empty() {
        return window.overlaps(metadata.start_ts, metadata.end_ts);
    }
    metadata.sessions.iter().any(|&instant| window.contains(instant))
}

/// Keep the hits that match the intent, one per event, in retrieval order
pub fn filter_candidates(
    candidates: Vec<CandidateDocument>,
    intent: &IntentWindow,
) -> Vec<CandidateDocument> {
    let Some(window) = intent.bounds else {
        return Vec::new();
    };
    if intent.is_greeting() {
        return Vec::new();
    }

    let total = candidates.len();
    let mut seen = HashSet::new();
    let kept: Vec<CandidateDocument> = candidates
        .into_iter()
        .filter(|doc| matches_window(&doc.metadata, &window))
        .filter(|doc| seen.insert(DedupKey::of(doc)))
        .collect();

    tracing::debug!(
        kind = %intent.kind,
        window = %window,
        candidates = total,
        kept = kept.len(),
        "Filtered candidates"
    );
    kept
}

/// Join retained events' `full_context`, or produce the sentinel
pub fn assemble_context(documents: &[CandidateDocument], intent: &IntentWindow) -> String {
    if intent.is_greeting() {
        return String::new();
    }
    if documents.is_empty() {
        return no_events_sentinel(&intent.display);
    }
    documents
        .iter()
        .map(|doc| doc.metadata.full_context.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Filter, deduplicate and assemble in one step
pub fn build_context(candidates: Vec<CandidateDocument>, intent: &IntentWindow) -> AssembledContext {
    let documents = filter_candidates(candidates, intent);
    let text = assemble_context(&documents, intent);
    AssembledContext { documents, text }
}
