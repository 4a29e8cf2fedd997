//! Contract for the federated (Google) auth service.

use crate::{GoogleUser, ProviderResult};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Federated identity provider.
///
/// The service owns its own session persistence. It answers the initial
/// session question once through [`current_user`](GoogleAuth::current_user)
/// and then pushes every later change on
/// [`session_changes`](GoogleAuth::session_changes).
#[async_trait]
pub trait GoogleAuth: Send + Sync {
    /// Run the interactive popup flow.
    async fn sign_in_with_popup(&self) -> ProviderResult<GoogleUser>;

    /// End the provider session.
    async fn sign_out(&self) -> ProviderResult<()>;

    /// Resolves once the provider has determined its initial session.
    async fn current_user(&self) -> ProviderResult<Option<GoogleUser>>;

    /// Stream of authoritative session changes.
    fn session_changes(&self) -> broadcast::Receiver<Option<GoogleUser>>;
}
