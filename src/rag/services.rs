//! Wiring of the ask and rebuild paths from a `Config`

use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{source, CatalogError, CatalogStore, EventSource, TimingNormalizer};
use crate::config::{Config, ConfigError};
use crate::generator::{self, GeneratorError};
use crate::index::{embedding, IndexError, IndexHandle, TextSplitter};
use crate::rag::{Assistant, Rebuilder};
use crate::time::Clock;

#[derive(Error, Debug)]
pub enum ServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Shared handles used by both the HTTP API and the CLI
#[derive(Clone)]
pub struct Services {
    pub index: Arc<IndexHandle>,
    pub assistant: Arc<Assistant>,
    pub rebuilder: Arc<Rebuilder>,
    pub store: CatalogStore,
    pub clock: Clock,
}

impl Services {
    /// Build everything from configuration, using the configured event source
    pub fn from_config(config: &Config) -> Result<Self, ServicesError> {
        let clock = config.clock()?;
        let source = source::from_config(&config.source, clock)?;
        Self::with_source(config, source)
    }

    /// Build everything from configuration with an explicit event source
    pub fn with_source(
        config: &Config,
        source: Box<dyn EventSource>,
    ) -> Result<Self, ServicesError> {
        let clock = config.clock()?;
        let store = CatalogStore::new(config.catalog.data_path());
        let index = Arc::new(IndexHandle::empty());
        let embedder = embedding::from_config(&config.embedding)?;
        let generator = generator::from_config(&config.generator)?;

        let rebuilder = Rebuilder::new(
            source,
            embedder,
            store.clone(),
            index.clone(),
            TimingNormalizer::new(clock, config.source.lang.clone()),
            TextSplitter::new(config.index.chunk_size, config.index.chunk_overlap),
            clock,
            config.source.recent_days,
        );
        let assistant = Assistant::new(index.clone(), generator, clock, config.index.top_k);

        tracing::info!(
            data_dir = ?store.data_dir(),
            top_k = config.index.top_k,
            "Services initialized"
        );

        Ok(Self {
            index,
            assistant: Arc::new(assistant),
            rebuilder: Arc::new(rebuilder),
            store,
            clock,
        })
    }
}
