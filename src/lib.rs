//! # Almanac
//!
//! Grounded question answering over a catalog of cultural events.
//!
//! A question such as "que faire ce week-end ?" goes through four stages:
//! temporal intent extraction, semantic retrieval, calendar filtering and
//! grounded generation. The catalog is fetched from OpenAgenda, normalized
//! once per rebuild and embedded into an in-memory vector index that is
//! swapped atomically when a rebuild succeeds.
//!
//! ## Modules
//!
//! - [`catalog`]: event sources, timing normalization and snapshots on disk
//! - [`index`]: chunking, embeddings and the semantic index
//! - [`retrieval`]: temporal intent and context assembly
//! - [`generator`]: prompt policy and language model clients
//! - [`rag`]: the ask and rebuild pipelines
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use almanac::config::Config;
//! use almanac::rag::Services;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.source.mock = true;
//!
//!     let services = Services::from_config(&config)?;
//!     let report = services.rebuilder.rebuild().await?;
//!     println!("Indexed {} events", report.events);
//!
//!     let answer = services.assistant.ask("Que faire ce week-end ?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod generator;
pub mod index;
pub mod logging;
pub mod rag;
pub mod retrieval;
pub mod time;

pub use config::Config;
pub use rag::{Answer, Assistant, Rebuilder, Services};
pub use retrieval::{extract_intent, IntentWindow};
pub use time::{Clock, TimeWindow, Timestamp};
