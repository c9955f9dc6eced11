//! Answer generator errors

use thiserror::Error;

/// Errors that can occur when asking the language model for an answer
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Language model unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Language model returned no answer")]
    EmptyResponse,
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
