//! Semantic Index
//!
//! - **chunker**: recursive character splitter over `search_text`
//! - **embedding**: `Embedder` trait, Mistral client and local hashing fallback
//! - **semantic**: immutable brute-force cosine index, persisted with bincode
//! - **handle**: hot-swappable `Arc` snapshot shared by readers
//!
//! # Query path
//!
//! ```text
//! question ──▶ Embedder::embed_query ──▶ cosine over chunks ──▶ top_k CandidateDocument
//! ```

pub mod chunker;
pub mod document;
pub mod embedding;
pub mod error;
pub mod handle;
pub mod semantic;

pub use chunker::TextSplitter;
pub use document::{CandidateDocument, EventMetadata};
pub use embedding::{Embedder, HashingEmbedder, MistralEmbedder};
pub use error::{IndexError, IndexResult};
pub use handle::IndexHandle;
pub use semantic::SemanticIndex;
