//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

pub use crate::config::ApiConfig;
use crate::index::IndexHandle;
use crate::rag::{Assistant, Rebuilder, Services};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Current index snapshot, swapped by rebuilds
    pub index: Arc<IndexHandle>,
    /// Ask path
    pub assistant: Arc<Assistant>,
    /// Rebuild path
    pub rebuilder: Arc<Rebuilder>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(services: Services, config: ApiConfig) -> Self {
        Self {
            index: services.index,
            assistant: services.assistant,
            rebuilder: services.rebuilder,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
