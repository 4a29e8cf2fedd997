//! Document store error types.

use thiserror::Error;

/// Failure talking to the document store.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Security rules rejected the request
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored document has an unexpected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using DocumentError.
pub type DocumentResult<T> = Result<T, DocumentError>;
