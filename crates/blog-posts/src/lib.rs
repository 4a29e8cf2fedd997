//! Blog operations for My Day.
//!
//! This crate provides [`BlogService`], which layers the permission rules on
//! top of the document store:
//! - Post listing, paging and author-only editing
//! - Likes keyed by user and post
//! - The signed-in user's profile page
//!
//! Callers pass the identity from the session reconciler to every operation.

mod error;
mod likes;
mod posts;
mod profile;
mod service;

pub use error::{BlogError, BlogResult};
pub use posts::{PostDraft, PostPage};
pub use service::{BlogService, DEFAULT_DISPLAY_NAME};
