//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::index::IndexError;
use crate::rag::{AssistantError, RebuildError};

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Index not built yet, or another dependency is down
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An upstream collaborator (agenda, embeddings, language model) failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::EmptyQuestion => ApiError::Validation(err.to_string()),
            AssistantError::IndexUnavailable => ApiError::ServiceUnavailable(err.to_string()),
            AssistantError::Index(_) | AssistantError::Generator(_) => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

impl From<RebuildError> for ApiError {
    fn from(err: RebuildError) -> Self {
        match &err {
            RebuildError::Catalog(CatalogError::Io(_))
            | RebuildError::Index(IndexError::Io(_))
            | RebuildError::Index(IndexError::Serialization(_)) => {
                ApiError::Internal(err.to_string())
            }
            RebuildError::Catalog(_) | RebuildError::Index(_) => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorError;

    #[test]
    fn test_assistant_error_mapping() {
        let cases = [
            (AssistantError::EmptyQuestion, StatusCode::BAD_REQUEST),
            (AssistantError::IndexUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                AssistantError::Generator(GeneratorError::Timeout),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_and_code().0, expected);
        }
    }

    #[test]
    fn test_rebuild_error_mapping() {
        let upstream = RebuildError::Catalog(CatalogError::Timeout);
        assert_eq!(ApiError::from(upstream).status_and_code().0, StatusCode::BAD_GATEWAY);

        let disk = RebuildError::Catalog(CatalogError::Io(std::io::Error::other("disk full")));
        assert_eq!(
            ApiError::from(disk).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body() {
        let response = ApiError::Validation("question must not be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
