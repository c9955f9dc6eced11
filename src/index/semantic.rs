//! Brute-force cosine index over event chunks
//!
//! A `SemanticIndex` is immutable once built. Rebuilding produces a new
//! index that replaces the old one through an `IndexHandle`.
//!
//! Persisted layout (`index.bin`, bincode):
//!
//! ```text
//! VectorStore
//! ├── embedder     identity of the embedder that produced the vectors
//! ├── built_at     ms since epoch
//! ├── events       Vec<EventMetadata>
//! └── chunks       Vec<{event, text, embedding}>
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::catalog::store::write_atomic;
use crate::catalog::NormalizedEvent;
use crate::index::chunker::TextSplitter;
use crate::index::document::{CandidateDocument, EventMetadata};
use crate::index::embedding::Embedder;
use crate::index::error::{IndexError, IndexResult};
use crate::time::Timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    /// Position of the owning event in `VectorStore::events`
    event: usize,
    text: String,
    embedding: Vec<f32>,
}

/// Serializable contents of the index
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorStore {
    embedder: String,
    built_at: Timestamp,
    events: Vec<EventMetadata>,
    chunks: Vec<StoredChunk>,
}

/// Searchable, immutable index snapshot
pub struct SemanticIndex {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("embedder", &self.store.embedder)
            .field("events", &self.store.events.len())
            .field("chunks", &self.store.chunks.len())
            .finish()
    }
}

impl SemanticIndex {
    /// Chunk and embed every event's `search_text`
    pub async fn build(
        events: &[NormalizedEvent],
        embedder: Arc<dyn Embedder>,
        splitter: &TextSplitter,
    ) -> IndexResult<Self> {
        let mut texts = Vec::new();
        let mut owners = Vec::new();

        for (position, event) in events.iter().enumerate() {
            for chunk in splitter.split(&event.search_text) {
                texts.push(chunk);
                owners.push(position);
            }
        }

        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            embedder.embed(&texts).await?
        };

        if embeddings.len() != texts.len() {
            return Err(IndexError::Embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let chunks = owners
            .into_iter()
            .zip(texts)
            .zip(embeddings)
            .map(|((event, text), embedding)| StoredChunk {
                event,
                text,
                embedding,
            })
            .collect::<Vec<_>>();

        let store = VectorStore {
            embedder: embedder.identity(),
            built_at: chrono::Utc::now().timestamp_millis(),
            events: events.iter().map(EventMetadata::from).collect(),
            chunks,
        };

        tracing::info!(
            events = store.events.len(),
            chunks = store.chunks.len(),
            embedder = %store.embedder,
            "Built semantic index"
        );

        Ok(Self { store, embedder })
    }

    /// Nearest chunks to `query`, best first
    ///
    /// Ties keep chunk insertion order.
    pub async fn search(&self, query: &str, top_k: usize) -> IndexResult<Vec<CandidateDocument>> {
        if self.store.chunks.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;

        let mut scored: Vec<(usize, f64)> = self
            .store
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&query_vector, &chunk.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let hits = scored
            .into_iter()
            .filter_map(|(i, score)| {
                let chunk = self.store.chunks.get(i)?;
                let metadata = self.store.events.get(chunk.event)?.clone();
                Some(CandidateDocument {
                    text: chunk.text.clone(),
                    metadata,
                    score,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(query, hits = hits.len(), "Semantic search");
        Ok(hits)
    }

    pub fn event_count(&self) -> usize {
        self.store.events.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.store.chunks.len()
    }

    pub fn built_at(&self) -> Timestamp {
        self.store.built_at
    }

    pub fn embedder_identity(&self) -> &str {
        &self.store.embedder
    }

    /// Persist to `path` (temporary file, then rename)
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let bytes = bincode::serialize(&self.store)?;
        write_atomic(path, &bytes).map_err(|e| match e {
            crate::catalog::CatalogError::Io(io) => IndexError::Io(io),
            other => IndexError::Serialization(other.to_string()),
        })?;
        tracing::info!(path = ?path, bytes = bytes.len(), "Saved semantic index");
        Ok(())
    }

    /// Load an index persisted by `save`
    ///
    /// Fails with `Incompatible` if it was built by a different embedder.
    pub fn load(path: &Path, embedder: Arc<dyn Embedder>) -> IndexResult<Self> {
        let bytes = std::fs::read(path)?;
        let store: VectorStore = bincode::deserialize(&bytes)?;

        let expected = embedder.identity();
        if store.embedder != expected {
            return Err(IndexError::Incompatible {
                expected,
                found: store.embedder,
            });
        }

        tracing::info!(
            path = ?path,
            events = store.events.len(),
            chunks = store.chunks.len(),
            "Loaded semantic index"
        );
        Ok(Self { store, embedder })
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero magnitude
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}
