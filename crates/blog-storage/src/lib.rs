//! Local persistence for the My Day blog client.
//!
//! This crate provides:
//! - The synchronous [`LocalStorage`] key/value contract
//! - In-memory and JSON-file backends
//! - [`SessionMarkerStore`], the typed API for the persisted session marker

mod file;
mod keys;
mod marker;
mod memory;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use marker::{CachedIdentity, LoginType, PersistedSessionMarker, SessionMarkerStore};
pub use memory::MemoryStorage;
pub use traits::LocalStorage;

use blog_config_and_utils::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default file-backed storage under the client's base directory.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn LocalStorage>> {
    let storage = FileStorage::open(paths.local_storage_file())?;
    Ok(Box::new(storage))
}

/// Create a SessionMarkerStore with the default storage.
pub fn create_marker_store(paths: &Paths) -> StorageResult<SessionMarkerStore> {
    let storage = create_storage(paths)?;
    Ok(SessionMarkerStore::new(storage))
}
