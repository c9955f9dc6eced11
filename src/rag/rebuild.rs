//! Catalog rebuild: fetch, normalize, index, publish
//!
//! ```text
//! EventSource ─▶ filter_recent ─▶ TimingNormalizer ─▶ SemanticIndex::build ─▶ save index, snapshots ─▶ publish
//! ```
//!
//! The new index is only published once every step succeeded; until then
//! the previous snapshot keeps serving.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::catalog::{filter_recent, CatalogError, CatalogStore, EventSource, TimingNormalizer};
use crate::index::{Embedder, IndexError, IndexHandle, SemanticIndex, TextSplitter};
use crate::time::Clock;

#[derive(Error, Debug)]
pub enum RebuildError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// Counts for one successful rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Records returned by the source
    pub fetched: usize,
    /// Records left after the recency filter
    pub retained: usize,
    /// Normalized events indexed
    pub events: usize,
    pub chunks: usize,
    pub duration_ms: u64,
}

pub struct Rebuilder {
    source: Box<dyn EventSource>,
    embedder: Arc<dyn Embedder>,
    store: CatalogStore,
    index: Arc<IndexHandle>,
    normalizer: TimingNormalizer,
    splitter: TextSplitter,
    clock: Clock,
    recent_days: i64,
    running: Mutex<()>,
}

impl Rebuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn EventSource>,
        embedder: Arc<dyn Embedder>,
        store: CatalogStore,
        index: Arc<IndexHandle>,
        normalizer: TimingNormalizer,
        splitter: TextSplitter,
        clock: Clock,
        recent_days: i64,
    ) -> Self {
        Self {
            source,
            embedder,
            store,
            index,
            normalizer,
            splitter,
            clock,
            recent_days,
            running: Mutex::new(()),
        }
    }

    /// Run a full rebuild; concurrent calls wait their turn
    pub async fn rebuild(&self) -> Result<RebuildReport, RebuildError> {
        let _guard = self.running.lock().await;
        let started = Instant::now();
        let now = self.clock.now();

        tracing::info!(source = self.source.name(), "Starting catalog rebuild");

        let raw = self.source.fetch_events().await?;
        let fetched = raw.len();

        let recent = filter_recent(raw, now, self.recent_days);
        let retained = recent.len();

        let events = self.normalizer.normalize_all(&recent, now);

        // Nothing touches the data dir until the new index exists
        let index = SemanticIndex::build(&events, self.embedder.clone(), &self.splitter).await?;
        index.save(&self.store.index_path())?;
        self.store.save_raw_events(&recent)?;
        self.store.save_events(&events)?;

        let report = RebuildReport {
            fetched,
            retained,
            events: index.event_count(),
            chunks: index.chunk_count(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        self.index.publish(index).await;

        tracing::info!(
            fetched = report.fetched,
            retained = report.retained,
            events = report.events,
            chunks = report.chunks,
            duration_ms = report.duration_ms,
            "Catalog rebuild complete"
        );
        Ok(report)
    }

    /// Publish the index persisted by a previous rebuild, if usable
    ///
    /// Returns whether an index was loaded.
    pub async fn load_persisted(&self) -> bool {
        let path = self.store.index_path();
        if !path.exists() {
            tracing::info!(path = ?path, "No persisted index, waiting for a rebuild");
            return false;
        }

        match SemanticIndex::load(&path, self.embedder.clone()) {
            Ok(index) => {
                self.index.publish(index).await;
                true
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Ignoring persisted index");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogResult, MockSource, RawEvent};
    use crate::index::{HashingEmbedder, IndexResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    /// Mock events until switched to failing
    struct FlakySource {
        clock: Clock,
        failing: Arc<AtomicBool>,
    }

    #[async_trait]
    impl EventSource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch_events(&self) -> CatalogResult<Vec<RawEvent>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(CatalogError::Unavailable("upstream down".to_string()));
            }
            Ok(vec![MockSource::event_at(self.clock.now()), RawEvent::default()])
        }
    }

    /// Hashing embeddings until switched to failing
    struct FlakyEmbedder {
        inner: HashingEmbedder,
        failing: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        fn identity(&self) -> String {
            self.inner.identity()
        }

        async fn embed(&self, texts: &[String]) -> IndexResult<Vec<Vec<f32>>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(IndexError::Embedding("embeddings backend down".to_string()));
            }
            self.inner.embed(texts).await
        }
    }

    /// Two events, then only the mock one once switched
    struct ShrinkingSource {
        clock: Clock,
        shrunk: Arc<AtomicBool>,
    }

    #[async_trait]
    impl EventSource for ShrinkingSource {
        fn name(&self) -> &str {
            "shrinking"
        }

        async fn fetch_events(&self) -> CatalogResult<Vec<RawEvent>> {
            let mut events = vec![MockSource::event_at(self.clock.now())];
            if !self.shrunk.load(Ordering::SeqCst) {
                events.push(RawEvent::default());
            }
            Ok(events)
        }
    }

    fn rebuilder(
        store: CatalogStore,
        index: Arc<IndexHandle>,
        source: Box<dyn EventSource>,
        dimensions: usize,
    ) -> Rebuilder {
        rebuilder_with(store, index, source, Arc::new(HashingEmbedder::new(dimensions)))
    }

    fn rebuilder_with(
        store: CatalogStore,
        index: Arc<IndexHandle>,
        source: Box<dyn EventSource>,
        embedder: Arc<dyn Embedder>,
    ) -> Rebuilder {
        Rebuilder::new(
            source,
            embedder,
            store,
            index,
            TimingNormalizer::new(Clock::utc(), "fr"),
            TextSplitter::new(1000, 200),
            Clock::utc(),
            365,
        )
    }

    #[tokio::test]
    async fn test_rebuild_publishes_and_persists() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let index = Arc::new(IndexHandle::empty());
        let rebuilder = rebuilder(
            store.clone(),
            index.clone(),
            Box::new(MockSource::new(Clock::utc())),
            64,
        );

        let report = rebuilder.rebuild().await.unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(report.retained, 1);
        assert_eq!(report.events, 1);
        assert_eq!(report.chunks, 1);
        assert!(index.is_ready().await);
        assert!(store.index_path().exists());
        assert_eq!(store.load_events().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_index() {
        let dir = tempdir().unwrap();
        let failing = Arc::new(AtomicBool::new(false));
        let index = Arc::new(IndexHandle::empty());
        let source = FlakySource {
            clock: Clock::utc(),
            failing: failing.clone(),
        };
        let rebuilder = rebuilder(CatalogStore::new(dir.path()), index.clone(), Box::new(source), 64);

        rebuilder.rebuild().await.unwrap();
        let before = index.snapshot().await.unwrap();

        failing.store(true, Ordering::SeqCst);
        let err = rebuilder.rebuild().await.unwrap_err();

        assert!(matches!(err, RebuildError::Catalog(CatalogError::Unavailable(_))));
        let after = index.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.event_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_embedding_leaves_data_dir_untouched() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let broken = Arc::new(AtomicBool::new(false));
        let index = Arc::new(IndexHandle::empty());
        let source = ShrinkingSource {
            clock: Clock::utc(),
            shrunk: broken.clone(),
        };
        let embedder = FlakyEmbedder {
            inner: HashingEmbedder::new(64),
            failing: broken.clone(),
        };
        let rebuilder = rebuilder_with(store.clone(), index.clone(), Box::new(source), Arc::new(embedder));

        rebuilder.rebuild().await.unwrap();
        let before = index.snapshot().await.unwrap();
        let raw_before = std::fs::read(store.raw_events_path()).unwrap();
        let index_before = std::fs::read(store.index_path()).unwrap();

        broken.store(true, Ordering::SeqCst);
        let err = rebuilder.rebuild().await.unwrap_err();

        assert!(matches!(err, RebuildError::Index(IndexError::Embedding(_))));
        let after = index.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(store.load_events().unwrap().len(), 2);
        assert_eq!(std::fs::read(store.raw_events_path()).unwrap(), raw_before);
        assert_eq!(std::fs::read(store.index_path()).unwrap(), index_before);
    }

    #[tokio::test]
    async fn test_load_persisted() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());

        let first = rebuilder(
            store.clone(),
            Arc::new(IndexHandle::empty()),
            Box::new(MockSource::new(Clock::utc())),
            64,
        );
        assert!(!first.load_persisted().await);
        first.rebuild().await.unwrap();

        let fresh = Arc::new(IndexHandle::empty());
        let second = rebuilder(
            store.clone(),
            fresh.clone(),
            Box::new(MockSource::new(Clock::utc())),
            64,
        );
        assert!(second.load_persisted().await);
        assert!(fresh.is_ready().await);

        let other = Arc::new(IndexHandle::empty());
        let mismatched = rebuilder(store, other.clone(), Box::new(MockSource::new(Clock::utc())), 32);
        assert!(!mismatched.load_persisted().await);
        assert!(!other.is_ready().await);
    }
}
