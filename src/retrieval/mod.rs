//! Query-time retrieval
//!
//! - **intent**: the Temporal Intent Extractor, a pure function of `(query, now)`
//! - **filter**: the Context Filter & Assembler
//!
//! ```text
//! question ──▶ extract_intent ──▶ IntentWindow ─────────────┐
//!     │                                                     ▼
//!     └──────▶ SemanticIndex::search ──▶ candidates ──▶ build_context ──▶ context
//! ```

pub mod filter;
pub mod intent;

pub use filter::{
    assemble_context, build_context, filter_candidates, matches_window, no_events_sentinel,
    AssembledContext, DedupKey, CONTEXT_SEPARATOR,
};
pub use intent::{extract_intent, IntentKind, IntentWindow};
