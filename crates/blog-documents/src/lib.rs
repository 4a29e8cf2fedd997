//! Document store layer for the My Day blog.
//!
//! This crate provides:
//! - The asynchronous [`DocumentStore`] contract (collections of JSON documents)
//! - [`MemoryDocumentStore`], an in-process implementation
//! - Record types for the `users`, `posts` and `likes` collections
//! - Typed query helpers over any store
//!
//! ```ignore
//! let store = MemoryDocumentStore::new();
//! let created = queries::ensure_user(&store, &new_user).await?;
//! ```

mod error;
mod memory;
mod models;
pub mod queries;
mod store;

pub use error::{DocumentError, DocumentResult};
pub use memory::MemoryDocumentStore;
pub use models::*;
pub use store::{from_document, to_document, Document, DocumentSnapshot, DocumentStore};
