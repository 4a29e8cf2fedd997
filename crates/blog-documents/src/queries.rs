//! Typed query helpers over any [`DocumentStore`].
//!
//! Each function takes the store as its first parameter so callers can pass
//! the hosted backend or the in-memory one.

use crate::{
    from_document, to_document, Author, DocumentResult, DocumentStore, Like, NewPost, NewUser,
    Post, ProfileUpdate, UserRecord, DEFAULT_USER_ROLE, LIKES, POSTS, USERS,
};
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

// ==========================================
// Users
// ==========================================

/// Get a user record by uid.
pub async fn get_user(store: &dyn DocumentStore, uid: &str) -> DocumentResult<Option<UserRecord>> {
    match store.get_document(USERS, uid).await? {
        Some(fields) => Ok(Some(from_document(fields)?)),
        None => Ok(None),
    }
}

/// Create the user record if it does not exist yet.
///
/// Returns the stored record and whether it was created by this call.
/// Existing records are never overwritten.
pub async fn ensure_user(
    store: &dyn DocumentStore,
    user: &NewUser,
) -> DocumentResult<(UserRecord, bool)> {
    if let Some(existing) = get_user(store, &user.uid).await? {
        debug!(uid = %user.uid, "User record already exists");
        return Ok((existing, false));
    }

    let record = UserRecord {
        uid: user.uid.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        photo_url: user.photo_url.clone(),
        created_at: Utc::now(),
        role: DEFAULT_USER_ROLE.to_string(),
    };
    store
        .set_document(USERS, &record.uid, to_document(&record)?)
        .await?;

    debug!(uid = %record.uid, "Created user record");
    Ok((record, true))
}

/// Update a user's display name and photo.
pub async fn update_user_profile(
    store: &dyn DocumentStore,
    uid: &str,
    update: &ProfileUpdate,
) -> DocumentResult<()> {
    store
        .update_document(USERS, uid, to_document(update)?)
        .await
}

// ==========================================
// Posts
// ==========================================

fn post_from_fields(id: String, fields: crate::Document) -> DocumentResult<Post> {
    let mut post: Post = from_document(fields)?;
    post.id = id;
    Ok(post)
}

/// All posts, newest first.
pub async fn list_posts(store: &dyn DocumentStore) -> DocumentResult<Vec<Post>> {
    let mut posts = store
        .list_documents(POSTS)
        .await?
        .into_iter()
        .map(|doc| post_from_fields(doc.id, doc.fields))
        .collect::<DocumentResult<Vec<_>>>()?;

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(posts)
}

/// Get a post by id.
pub async fn get_post(store: &dyn DocumentStore, id: &str) -> DocumentResult<Option<Post>> {
    match store.get_document(POSTS, id).await? {
        Some(fields) => Ok(Some(post_from_fields(id.to_string(), fields)?)),
        None => Ok(None),
    }
}

/// Insert a new post under a generated id.
pub async fn insert_post(store: &dyn DocumentStore, post: &NewPost) -> DocumentResult<Post> {
    let now = Utc::now();
    let mut record = Post {
        id: String::new(),
        title: post.title.clone(),
        content: post.content.clone(),
        author: post.author.clone(),
        created_at: now,
        updated_at: Some(now),
    };

    record.id = store.add_document(POSTS, to_document(&record)?).await?;
    debug!(post_id = %record.id, author = %record.author.uid, "Inserted post");
    Ok(record)
}

/// Replace a post's title and content and bump `updatedAt`.
pub async fn update_post(
    store: &dyn DocumentStore,
    id: &str,
    title: &str,
    content: &str,
) -> DocumentResult<()> {
    let mut fields = crate::Document::new();
    fields.insert("title".to_string(), Value::from(title));
    fields.insert("content".to_string(), Value::from(content));
    fields.insert(
        "updatedAt".to_string(),
        serde_json::to_value(Utc::now())?,
    );
    store.update_document(POSTS, id, fields).await
}

/// Delete a post.
pub async fn delete_post(store: &dyn DocumentStore, id: &str) -> DocumentResult<()> {
    store.delete_document(POSTS, id).await
}

/// Author snapshot for a uid, preferring the stored profile's fields.
pub async fn author_for(
    store: &dyn DocumentStore,
    uid: &str,
    fallback: Author,
) -> DocumentResult<Author> {
    Ok(match get_user(store, uid).await? {
        Some(user) => Author {
            uid: uid.to_string(),
            email: if user.email.is_empty() { fallback.email } else { user.email },
            photo_url: fallback.photo_url,
            name: if user.name.is_empty() { fallback.name } else { user.name },
        },
        None => fallback,
    })
}

// ==========================================
// Likes
// ==========================================

/// Get a user's like of a post.
pub async fn get_like(
    store: &dyn DocumentStore,
    user_id: &str,
    post_id: &str,
) -> DocumentResult<Option<Like>> {
    match store
        .get_document(LIKES, &Like::document_id(user_id, post_id))
        .await?
    {
        Some(fields) => Ok(Some(from_document(fields)?)),
        None => Ok(None),
    }
}

/// Record a like. Liking twice keeps a single document.
pub async fn insert_like(
    store: &dyn DocumentStore,
    user_id: &str,
    post_id: &str,
) -> DocumentResult<Like> {
    let like = Like {
        user_id: user_id.to_string(),
        post_id: post_id.to_string(),
        created_at: Utc::now(),
    };
    store
        .set_document(
            LIKES,
            &Like::document_id(user_id, post_id),
            to_document(&like)?,
        )
        .await?;
    Ok(like)
}

/// Remove a like.
pub async fn delete_like(
    store: &dyn DocumentStore,
    user_id: &str,
    post_id: &str,
) -> DocumentResult<()> {
    store
        .delete_document(LIKES, &Like::document_id(user_id, post_id))
        .await
}

/// Every like by a user, newest first.
pub async fn likes_for_user(store: &dyn DocumentStore, user_id: &str) -> DocumentResult<Vec<Like>> {
    let mut likes = store
        .query_eq(LIKES, "userId", &Value::from(user_id))
        .await?
        .into_iter()
        .map(|doc| from_document::<Like>(doc.fields))
        .collect::<DocumentResult<Vec<_>>>()?;

    likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(likes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentError, MemoryDocumentStore};
    use std::time::Duration;

    fn author(uid: &str) -> Author {
        Author {
            uid: uid.to_string(),
            email: format!("{}@x.com", uid),
            photo_url: String::new(),
            name: uid.to_uppercase(),
        }
    }

    fn new_user(uid: &str, name: &str) -> NewUser {
        NewUser {
            uid: uid.to_string(),
            name: name.to_string(),
            email: format!("{}@x.com", uid),
            photo_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_ensure_user_creates_once() {
        let store = MemoryDocumentStore::new();

        let (created, was_created) = ensure_user(&store, &new_user("u1", "first")).await.unwrap();
        assert!(was_created);
        assert_eq!(created.role, "user");

        let (existing, was_created) = ensure_user(&store, &new_user("u1", "second"))
            .await
            .unwrap();
        assert!(!was_created);
        assert_eq!(existing.name, "first");
    }

    #[tokio::test]
    async fn test_update_user_profile() {
        let store = MemoryDocumentStore::new();
        ensure_user(&store, &new_user("u1", "old")).await.unwrap();

        update_user_profile(
            &store,
            "u1",
            &ProfileUpdate {
                name: "new".to_string(),
                photo_url: "http://img".to_string(),
            },
        )
        .await
        .unwrap();

        let user = get_user(&store, "u1").await.unwrap().unwrap();
        assert_eq!(user.name, "new");
        assert_eq!(user.photo_url, "http://img");
        assert_eq!(user.email, "u1@x.com");
    }

    #[tokio::test]
    async fn test_update_profile_of_unknown_user_fails() {
        let store = MemoryDocumentStore::new();
        let result = update_user_profile(
            &store,
            "ghost",
            &ProfileUpdate {
                name: "x".to_string(),
                photo_url: String::new(),
            },
        )
        .await;
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() {
        let store = MemoryDocumentStore::new();

        let first = insert_post(
            &store,
            &NewPost {
                title: "first".to_string(),
                content: "a".to_string(),
                author: author("u1"),
            },
        )
        .await
        .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let second = insert_post(
            &store,
            &NewPost {
                title: "second".to_string(),
                content: "b".to_string(),
                author: author("u1"),
            },
        )
        .await
        .unwrap();

        let posts = list_posts(&store).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);
    }

    #[tokio::test]
    async fn test_update_post_bumps_updated_at() {
        let store = MemoryDocumentStore::new();
        let post = insert_post(
            &store,
            &NewPost {
                title: "t".to_string(),
                content: "c".to_string(),
                author: author("u1"),
            },
        )
        .await
        .unwrap();

        update_post(&store, &post.id, "t2", "c2").await.unwrap();

        let updated = get_post(&store, &post.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "t2");
        assert_eq!(updated.content, "c2");
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at.unwrap() >= post.created_at);
    }

    #[tokio::test]
    async fn test_author_for_prefers_stored_profile() {
        let store = MemoryDocumentStore::new();
        ensure_user(&store, &new_user("u1", "Stored Name")).await.unwrap();

        let resolved = author_for(&store, "u1", author("u1")).await.unwrap();
        assert_eq!(resolved.name, "Stored Name");

        let unknown = author_for(&store, "u2", author("u2")).await.unwrap();
        assert_eq!(unknown.name, "U2");
    }

    #[tokio::test]
    async fn test_likes_round_trip() {
        let store = MemoryDocumentStore::new();

        insert_like(&store, "u1", "p1").await.unwrap();
        insert_like(&store, "u1", "p1").await.unwrap();
        insert_like(&store, "u1", "p2").await.unwrap();
        insert_like(&store, "u2", "p1").await.unwrap();

        let likes = likes_for_user(&store, "u1").await.unwrap();
        assert_eq!(likes.len(), 2);
        assert!(get_like(&store, "u1", "p1").await.unwrap().is_some());

        delete_like(&store, "u1", "p1").await.unwrap();
        assert!(get_like(&store, "u1", "p1").await.unwrap().is_none());
        assert_eq!(likes_for_user(&store, "u1").await.unwrap().len(), 1);
    }
}
