//! Common error types for tubeloop

use thiserror::Error;

/// Common result type for tubeloop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across tubeloop services
#[derive(Error, Debug)]
pub enum Error {
    /// No channels configured (fatal to a selection request)
    #[error("no channels configured")]
    NoChannels,

    /// Candidate provider failure (API or feed fetch)
    #[error("provider error: {0}")]
    Provider(String),

    /// Document store I/O error (wraps std::io::Error)
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON document encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client or server error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid user input or request parameter
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
