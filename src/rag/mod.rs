//! Orchestration
//!
//! - **assistant**: ask path (intent, search, filter, generate)
//! - **rebuild**: operator-triggered catalog refresh with atomic index swap
//! - **services**: wiring shared by the HTTP API and the CLI

pub mod assistant;
pub mod rebuild;
pub mod services;

pub use assistant::{Answer, Assistant, AssistantError, Retrieval, Source};
pub use rebuild::{RebuildError, RebuildReport, Rebuilder};
pub use services::{Services, ServicesError};
