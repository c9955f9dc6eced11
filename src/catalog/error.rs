//! Catalog error types
//!
//! Errors raised while fetching raw events or reading/writing snapshots.

use thiserror::Error;

/// Errors that can occur while collecting or persisting the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The upstream agenda could not be reached
    #[error("Agenda unavailable: {0}")]
    Unavailable(String),

    /// The upstream agenda did not answer in time
    #[error("Agenda request timed out")]
    Timeout,

    /// The upstream agenda answered with an error status
    #[error("Agenda API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Request failed for another reason
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Payload could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::Api {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Agenda API error 403: forbidden");
        assert_eq!(CatalogError::Timeout.to_string(), "Agenda request timed out");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CatalogError = json_err.into();
        assert!(matches!(err, CatalogError::Serialization(_)));
    }
}
