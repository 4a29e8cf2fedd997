//! The blog service and its shared helpers.

use crate::{BlogError, BlogResult};
use blog_auth::{Identity, PermissionGate};
use blog_config_and_utils::Config;
use blog_documents::DocumentStore;
use std::sync::Arc;

/// Name shown when neither the stored profile nor the provider has one.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Posts, likes and profile operations over a document store.
///
/// Every write takes the caller's identity explicitly; the service keeps no
/// session of its own.
pub struct BlogService {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) gate: PermissionGate,
    pub(crate) page_size: usize,
}

impl BlogService {
    pub fn new(store: Arc<dyn DocumentStore>, gate: PermissionGate, page_size: usize) -> Self {
        Self {
            store,
            gate,
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self::new(store, PermissionGate::from_config(config), config.page_size)
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub(crate) fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

pub(crate) fn require_identity(identity: Option<&Identity>) -> BlogResult<&Identity> {
    identity.ok_or(BlogError::NotSignedIn)
}

/// Trimmed, non-empty field value.
pub(crate) fn required_field(field: &str, value: &str) -> BlogResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BlogError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
