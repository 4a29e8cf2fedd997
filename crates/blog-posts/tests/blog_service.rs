use async_trait::async_trait;
use blog_auth::{Identity, PermissionGate};
use blog_documents::{
    queries, Document, DocumentError, DocumentResult, DocumentSnapshot, DocumentStore,
    MemoryDocumentStore, NewUser, LIKES, POSTS,
};
use blog_posts::{BlogError, BlogService, PostDraft, DEFAULT_DISPLAY_NAME};
use std::sync::Arc;
use std::time::Duration;

const ADMIN_EMAIL: &str = "admin@gmail.com";

fn identity(uid: &str, email: &str, name: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: email.to_string(),
        display_name: name.to_string(),
        photo_url: format!("https://img.example/{}.png", uid),
    }
}

fn admin() -> Identity {
    identity("admin-uid", ADMIN_EMAIL, "Admin")
}

fn reader() -> Identity {
    identity("reader-uid", "reader@gmail.com", "Reader")
}

fn service() -> (BlogService, Arc<MemoryDocumentStore>) {
    let store = Arc::new(MemoryDocumentStore::new());
    let service = BlogService::new(store.clone(), PermissionGate::new([ADMIN_EMAIL]), 2);
    (service, store)
}

async fn publish(service: &BlogService, title: &str) -> blog_documents::Post {
    let post = service
        .create_post(Some(&admin()), &PostDraft::new(title, "body"))
        .await
        .expect("admin should be able to post");
    // Keep createdAt strictly increasing between posts
    tokio::time::sleep(Duration::from_millis(3)).await;
    post
}

// ==========================================
// Posts
// ==========================================

#[tokio::test]
async fn admin_creates_post_with_author_snapshot() {
    let (service, store) = service();
    queries::ensure_user(
        store.as_ref(),
        &NewUser {
            uid: "admin-uid".to_string(),
            name: "Stored Admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
            photo_url: String::new(),
        },
    )
    .await
    .unwrap();

    let post = service
        .create_post(Some(&admin()), &PostDraft::new(" Hello ", "First post"))
        .await
        .unwrap();

    assert_eq!(post.title, "Hello");
    assert_eq!(post.author.uid, "admin-uid");
    assert_eq!(post.author.name, "Stored Admin");
    assert_eq!(post.author.photo_url, "https://img.example/admin-uid.png");
    assert_eq!(service.get_post(&post.id).await.unwrap(), post);
}

#[tokio::test]
async fn author_without_any_name_gets_default() {
    let (service, _store) = service();
    let nameless = identity("admin-uid", ADMIN_EMAIL, "");

    let post = service
        .create_post(Some(&nameless), &PostDraft::new("t", "c"))
        .await
        .unwrap();

    assert_eq!(post.author.name, DEFAULT_DISPLAY_NAME);
}

#[tokio::test]
async fn non_admin_cannot_create_post() {
    let (service, store) = service();

    let denied = service
        .create_post(Some(&reader()), &PostDraft::new("t", "c"))
        .await;
    let anonymous = service.create_post(None, &PostDraft::new("t", "c")).await;

    assert!(matches!(denied, Err(BlogError::PermissionDenied(_))));
    assert!(matches!(anonymous, Err(BlogError::NotSignedIn)));
    assert_eq!(store.len(POSTS).await, 0);
}

#[tokio::test]
async fn empty_post_is_rejected() {
    let (service, store) = service();

    let result = service
        .create_post(Some(&admin()), &PostDraft::new("title", "  "))
        .await;

    assert!(matches!(result, Err(BlogError::Validation(_))));
    assert_eq!(store.len(POSTS).await, 0);
}

#[tokio::test]
async fn posts_page_newest_first() {
    let (service, _store) = service();
    for title in ["one", "two", "three"] {
        publish(&service, title).await;
    }

    let all = service.list_posts().await.unwrap();
    assert_eq!(
        all.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["three", "two", "one"]
    );

    let first = service.list_page(1).await.unwrap();
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.posts.len(), 2);
    assert_eq!(first.posts[0].title, "three");

    let second = service.list_page(2).await.unwrap();
    assert_eq!(second.posts.len(), 1);
    assert_eq!(second.posts[0].title, "one");
    assert!(!second.has_next());
}

#[tokio::test]
async fn only_author_can_edit_or_delete() {
    let (service, _store) = service();
    let post = publish(&service, "mine").await;

    // Another admin is still not the author
    let other_admin = identity("other-uid", ADMIN_EMAIL, "Other");
    let edit = service
        .update_post(Some(&other_admin), &post.id, &PostDraft::new("x", "y"))
        .await;
    assert!(matches!(edit, Err(BlogError::PermissionDenied(_))));

    let delete = service.delete_post(None, &post.id).await;
    assert!(matches!(delete, Err(BlogError::NotSignedIn)));

    assert!(!service.can_edit(Some(&reader()), &post.id).await.unwrap());
    assert!(!service.can_edit(None, &post.id).await.unwrap());
    assert!(service.can_edit(Some(&admin()), &post.id).await.unwrap());

    let unchanged = service.get_post(&post.id).await.unwrap();
    assert_eq!(unchanged.title, "mine");
}

#[tokio::test]
async fn author_updates_and_deletes_post() {
    let (service, _store) = service();
    let post = publish(&service, "draft").await;

    let updated = service
        .update_post(Some(&admin()), &post.id, &PostDraft::new("final", "new body"))
        .await
        .unwrap();
    assert_eq!(updated.title, "final");
    assert_eq!(updated.content, "new body");
    assert_eq!(updated.created_at, post.created_at);
    assert!(updated.updated_at.unwrap() >= post.updated_at.unwrap());

    service.delete_post(Some(&admin()), &post.id).await.unwrap();
    assert!(matches!(
        service.get_post(&post.id).await,
        Err(BlogError::NotFound(_))
    ));
}

#[tokio::test]
async fn editing_missing_post_is_not_found() {
    let (service, _store) = service();
    let result = service
        .update_post(Some(&admin()), "ghost", &PostDraft::new("t", "c"))
        .await;
    assert!(matches!(result, Err(BlogError::NotFound(_))));
}

// ==========================================
// Likes
// ==========================================

#[tokio::test]
async fn toggle_like_round_trip() {
    let (service, store) = service();
    let post = publish(&service, "likeable").await;
    let me = reader();

    assert!(!service.is_liked(Some(&me), &post.id).await.unwrap());
    assert!(service.toggle_like(Some(&me), &post.id).await.unwrap());
    assert!(service.is_liked(Some(&me), &post.id).await.unwrap());
    assert!(store
        .get_document(LIKES, &format!("reader-uid_{}", post.id))
        .await
        .unwrap()
        .is_some());

    assert!(!service.toggle_like(Some(&me), &post.id).await.unwrap());
    assert!(!service.is_liked(Some(&me), &post.id).await.unwrap());
    assert!(!service.is_liked(None, &post.id).await.unwrap());
}

#[tokio::test]
async fn liking_requires_sign_in_and_existing_post() {
    let (service, store) = service();

    assert!(matches!(
        service.toggle_like(None, "p1").await,
        Err(BlogError::NotSignedIn)
    ));
    assert!(matches!(
        service.toggle_like(Some(&reader()), "ghost").await,
        Err(BlogError::NotFound(_))
    ));
    assert_eq!(store.len(LIKES).await, 0);
}

#[tokio::test]
async fn liked_posts_skip_deleted_posts() {
    let (service, _store) = service();
    let kept = publish(&service, "kept").await;
    let removed = publish(&service, "removed").await;
    let me = reader();

    service.toggle_like(Some(&me), &kept.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3)).await;
    service.toggle_like(Some(&me), &removed.id).await.unwrap();
    service.delete_post(Some(&admin()), &removed.id).await.unwrap();

    let ids = service.liked_post_ids(Some(&me)).await.unwrap();
    assert_eq!(ids, vec![removed.id.clone(), kept.id.clone()]);

    let posts = service.liked_posts(Some(&me)).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, kept.id);

    service.remove_like(Some(&me), &kept.id).await.unwrap();
    service.remove_like(Some(&me), &kept.id).await.unwrap();
    assert!(service.liked_posts(Some(&me)).await.unwrap().is_empty());
}

// ==========================================
// Profile
// ==========================================

#[tokio::test]
async fn update_profile_creates_missing_record() {
    let (service, _store) = service();
    let me = reader();

    assert!(service.get_profile(Some(&me)).await.unwrap().is_none());

    let updated = service
        .update_profile(Some(&me), "  New Name ", "https://img.example/new.png")
        .await
        .unwrap();

    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.photo_url, "https://img.example/new.png");
    assert_eq!(updated.email, "reader@gmail.com");
    assert_eq!(updated.role, "user");
    assert_eq!(service.display_name(&me).await.unwrap(), "New Name");
}

#[tokio::test]
async fn update_profile_validates_name() {
    let (service, _store) = service();

    assert!(matches!(
        service.update_profile(Some(&reader()), " ", "").await,
        Err(BlogError::Validation(_))
    ));
    assert!(matches!(
        service.update_profile(None, "name", "").await,
        Err(BlogError::NotSignedIn)
    ));
}

#[tokio::test]
async fn display_name_falls_back_to_provider_then_default() {
    let (service, _store) = service();

    assert_eq!(service.display_name(&reader()).await.unwrap(), "Reader");
    assert_eq!(
        service
            .display_name(&identity("u9", "u9@x.com", ""))
            .await
            .unwrap(),
        DEFAULT_DISPLAY_NAME
    );
}

// ==========================================
// Store failures
// ==========================================

/// Store that reads fine but refuses every write.
struct ReadOnlyStore(MemoryDocumentStore);

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn get_document(&self, collection: &str, id: &str) -> DocumentResult<Option<Document>> {
        self.0.get_document(collection, id).await
    }

    async fn set_document(&self, _collection: &str, _id: &str, _fields: Document) -> DocumentResult<()> {
        Err(DocumentError::PermissionDenied("read-only".to_string()))
    }

    async fn update_document(&self, _collection: &str, _id: &str, _fields: Document) -> DocumentResult<()> {
        Err(DocumentError::PermissionDenied("read-only".to_string()))
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> DocumentResult<()> {
        Err(DocumentError::PermissionDenied("read-only".to_string()))
    }

    async fn add_document(&self, _collection: &str, _fields: Document) -> DocumentResult<String> {
        Err(DocumentError::PermissionDenied("read-only".to_string()))
    }

    async fn list_documents(&self, collection: &str) -> DocumentResult<Vec<DocumentSnapshot>> {
        self.0.list_documents(collection).await
    }
}

#[tokio::test]
async fn store_failure_surfaces_on_gated_write() {
    let service = BlogService::new(
        Arc::new(ReadOnlyStore(MemoryDocumentStore::new())),
        PermissionGate::new([ADMIN_EMAIL]),
        5,
    );

    let result = service
        .create_post(Some(&admin()), &PostDraft::new("t", "c"))
        .await;

    assert!(matches!(result, Err(BlogError::Store(DocumentError::PermissionDenied(_)))));
    assert!(service.list_posts().await.unwrap().is_empty());
}
