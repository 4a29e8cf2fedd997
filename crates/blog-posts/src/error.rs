//! Blog operation errors.

use blog_documents::DocumentError;
use thiserror::Error;

/// Errors from gated blog operations.
///
/// A failed operation never leaves a partial write behind.
#[derive(Error, Debug)]
pub enum BlogError {
    /// The signed-in user may not perform this action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The post or profile does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The action needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Rejected input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Document store failure
    #[error("Store error: {0}")]
    Store(#[from] DocumentError),
}

impl BlogError {
    /// Whether signing in (or in as someone else) could make the action succeed.
    pub fn needs_sign_in(&self) -> bool {
        matches!(self, BlogError::NotSignedIn | BlogError::PermissionDenied(_))
    }
}

/// Result type alias using BlogError.
pub type BlogResult<T> = Result<T, BlogError>;
