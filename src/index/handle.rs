//! Shared, hot-swappable reference to the current index

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::index::semantic::SemanticIndex;

/// Holds the index currently serving queries
///
/// Readers clone the inner `Arc` and release the lock immediately, so a
/// query keeps its snapshot even if a rebuild publishes a new one meanwhile.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<SemanticIndex>>>,
}

impl IndexHandle {
    /// Handle with no index published yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_index(index: SemanticIndex) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(index))),
        }
    }

    /// Current snapshot, if any
    pub async fn snapshot(&self) -> Option<Arc<SemanticIndex>> {
        self.current.read().await.clone()
    }

    /// Replace the current index, returning the previous one
    pub async fn publish(&self, index: SemanticIndex) -> Option<Arc<SemanticIndex>> {
        let next = Arc::new(index);
        let previous = self.current.write().await.replace(next);
        tracing::info!(replaced = previous.is_some(), "Published new index snapshot");
        previous
    }

    pub async fn is_ready(&self) -> bool {
        self.current.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{HashingEmbedder, TextSplitter};

    async fn index_of(count: usize) -> SemanticIndex {
        let events: Vec<_> = (0..count)
            .map(|i| crate::catalog::NormalizedEvent {
                id: i.to_string(),
                title: String::new(),
                description: String::new(),
                location_text: String::new(),
                keywords: String::new(),
                url: None,
                sessions: vec![],
                future_sessions: vec![],
                past_sessions: vec![],
                start_ts: 0,
                end_ts: 0,
                search_text: format!("Titre: evenement {i}"),
                full_context: String::new(),
            })
            .collect();
        SemanticIndex::build(
            &events,
            Arc::new(HashingEmbedder::new(32)),
            &TextSplitter::new(1000, 200),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_handle() {
        let handle = IndexHandle::empty();
        assert!(!handle.is_ready().await);
        assert!(handle.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_publish() {
        let handle = IndexHandle::with_index(index_of(1).await);
        let before = handle.snapshot().await.unwrap();

        let previous = handle.publish(index_of(2).await).await;

        assert!(previous.is_some());
        assert_eq!(before.event_count(), 1);
        assert_eq!(handle.snapshot().await.unwrap().event_count(), 2);
    }
}
