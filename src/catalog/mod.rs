//! Event Catalog
//!
//! Ingestion side of Almanac:
//!
//! - **types**: raw upstream records and the normalized event
//! - **normalizer**: the Timing Normalizer
//! - **source**: upstream agenda clients (OpenAgenda, file, mock)
//! - **store**: JSON snapshots in the data directory
//! - **error**: error types
//!
//! # Ingestion path
//!
//! ```text
//! EventSource ──▶ filter_recent ──▶ TimingNormalizer ──▶ NormalizedEvent
//!                      │                                      │
//!                raw_events.json                         events.json
//! ```

pub mod error;
pub mod normalizer;
pub mod source;
pub mod store;
pub mod types;

pub use error::{CatalogError, CatalogResult};
pub use normalizer::{parse_instant, Schedule, TimingNormalizer, UNSPECIFIED_DATES};
pub use source::{filter_recent, EventSource, FileSource, MockSource, OpenAgendaSource};
pub use store::CatalogStore;
pub use types::{NormalizedEvent, RawEvent, RawSession, Session};
