//! Index error types

use thiserror::Error;

/// Errors raised while embedding, building, searching or persisting the index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Embedding backend could not be reached
    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),

    /// Embedding backend did not answer in time
    #[error("Embedding request timed out")]
    Timeout,

    /// Embedding backend answered with an error status
    #[error("Embedding API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Request failed for another reason
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend returned something unusable (wrong count, empty vectors)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Persisted index was built with another embedder
    #[error("Index was built with embedder {found}, current embedder is {expected}")]
    Incompatible { expected: String, found: String },

    /// Encoding or decoding of the persisted index failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid embedder configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for IndexError {
    fn from(err: bincode::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::Incompatible {
            expected: "hashing:384".to_string(),
            found: "mistral:mistral-embed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Index was built with embedder mistral:mistral-embed, current embedder is hashing:384"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IndexError = io_err.into();
        assert!(matches!(err, IndexError::Io(_)));
    }
}
