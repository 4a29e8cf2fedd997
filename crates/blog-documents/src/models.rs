//! Record types stored in the document store.
//!
//! Field names follow the hosted database's camelCase layout (`photoURL`,
//! `createdAt`, `userId`) so existing documents deserialize unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection holding one profile per signed-in user, keyed by uid.
pub const USERS: &str = "users";
/// Collection holding blog posts under generated ids.
pub const POSTS: &str = "posts";
/// Collection holding likes keyed `"{uid}_{postId}"`.
pub const LIKES: &str = "likes";

/// Role recorded on newly bootstrapped users.
pub const DEFAULT_USER_ROLE: &str = "user";

/// Profile record in `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_USER_ROLE.to_string()
}

/// Fields needed to bootstrap a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub photo_url: String,
}

/// Editable part of a user profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

/// Author snapshot embedded in a post at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
    #[serde(default)]
    pub name: String,
}

/// Blog post in `posts/{id}`.
///
/// `id` is the document id and is never stored inside the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for a post about to be created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: Author,
}

/// Like in `likes/{uid}_{postId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl Like {
    /// Document id for a user's like of a post.
    pub fn document_id(user_id: &str, post_id: &str) -> String {
        format!("{}_{}", user_id, post_id)
    }
}
