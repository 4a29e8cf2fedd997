//! Authentication error types.

use blog_documents::DocumentError;
use blog_storage::StorageError;
use thiserror::Error;

/// Errors reported by the session reconciler.
///
/// Provider failures are translated into these variants before they leave
/// this crate; presentation code never sees a provider's own error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Interactive login was rejected, cancelled or failed
    #[error("Sign-in failed: {0}")]
    AuthFailed(String),

    /// The Kakao SDK could not be loaded or initialized
    #[error("Kakao SDK unavailable: {0}")]
    SdkUnavailable(String),

    /// A login result arrived after the attempt was superseded
    #[error("Stale session response discarded")]
    StaleSessionResponse,

    /// Document store failure
    #[error("Store error: {0}")]
    Store(#[from] DocumentError),

    /// Local persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,
}

impl AuthError {
    /// Whether presentation code should show this error to the user.
    ///
    /// Stale responses are dropped silently.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AuthError::StaleSessionResponse)
    }

    /// Whether retrying the same action later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::SdkUnavailable(_)
                | AuthError::Store(DocumentError::Unavailable(_))
        )
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure reported by an identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The user closed the popup or declined consent
    #[error("cancelled by user")]
    Cancelled,

    /// The provider refused the request
    #[error("rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The provider SDK is not loaded or not initialized
    #[error("sdk unavailable: {0}")]
    SdkUnavailable(String),

    /// The provider returned a profile we cannot read
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// A callback was dropped without ever being invoked
    #[error("callback dropped before completion")]
    Interrupted,
}

/// Result type alias using ProviderError.
pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::SdkUnavailable(reason) => AuthError::SdkUnavailable(reason),
            other => AuthError::AuthFailed(other.to_string()),
        }
    }
}
