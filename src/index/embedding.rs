//! Text embedders
//!
//! `MistralEmbedder` calls the hosted embeddings endpoint. `HashingEmbedder`
//! is a local, deterministic bag-of-words embedder used when no API key is
//! configured, so the index can always be built offline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::index::error::{IndexError, IndexResult};

/// Inputs sent per embeddings request
const BATCH_SIZE: usize = 32;

/// Turns texts into fixed-size vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identity written next to persisted vectors
    fn identity(&self) -> String;

    /// Embed a batch of texts, one vector per input, in order
    async fn embed(&self, texts: &[String]) -> IndexResult<Vec<Vec<f32>>>;

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> IndexResult<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| IndexError::Embedding("no vector returned for query".to_string()))
    }
}

/// Pick the embedder described by the configuration
pub fn from_config(config: &EmbeddingConfig) -> IndexResult<Arc<dyn Embedder>> {
    match (config.provider, config.usable_api_key()) {
        (EmbeddingProvider::Hashing, _) => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
        (EmbeddingProvider::Mistral, None) => Err(IndexError::Config(
            "embedding provider 'mistral' requires MISTRAL_API_KEY".to_string(),
        )),
        (_, Some(key)) => Ok(Arc::new(MistralEmbedder::new(config, key)?)),
        (EmbeddingProvider::Auto, None) => {
            tracing::warn!(
                dimensions = config.dimensions,
                "No Mistral API key configured, falling back to local hashing embeddings"
            );
            Ok(Arc::new(HashingEmbedder::new(config.dimensions)))
        }
    }
}

// ============================================================================
// Mistral
// ============================================================================

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for the Mistral embeddings endpoint
pub struct MistralEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl MistralEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> IndexResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.to_string(),
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: batch,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IndexError::Timeout
                } else if e.is_connect() {
                    IndexError::Unavailable(e.to_string())
                } else {
                    IndexError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(IndexError::Api { status, message });
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Embedding(format!("parse response: {e}")))?;

        if body.data.len() != batch.len() {
            return Err(IndexError::Embedding(format!(
                "expected {} vectors, got {}",
                batch.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for MistralEmbedder {
    fn identity(&self) -> String {
        format!("mistral:{}", self.model)
    }

    async fn embed(&self, texts: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        tracing::debug!(count = vectors.len(), model = %self.model, "Embedded texts");
        Ok(vectors)
    }
}

// ============================================================================
// Local feature hashing
// ============================================================================

/// Deterministic feature-hashing embedder
///
/// Each lower-cased alphanumeric token of two or more characters is hashed
/// with CRC32; the hash picks a dimension and a sign. Vectors are L2
/// normalized, so cosine similarity reduces to a dot product.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let hash = crc32fast::hash(token.as_bytes());
            let slot = hash as usize % self.dimensions;
            let sign = if hash & 0x8000_0000 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn identity(&self) -> String {
        format!("hashing:{}", self.dimensions)
    }

    async fn embed(&self, texts: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
