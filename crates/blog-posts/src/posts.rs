//! Post listing and gated post writes.

use crate::service::{require_identity, required_field, DEFAULT_DISPLAY_NAME};
use crate::{BlogError, BlogResult, BlogService};
use blog_auth::Identity;
use blog_documents::{queries, NewPost, Post};
use tracing::{debug, info};

/// Title and body of a post being written.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Title trimmed; content kept verbatim. Both must have visible text.
    fn validated(&self) -> BlogResult<(String, String)> {
        let title = required_field("title", &self.title)?;
        required_field("content", &self.content)?;
        Ok((title, self.content.clone()))
    }
}

/// One page of the newest-first post list.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    pub total_posts: usize,
}

impl PostPage {
    fn slice(all: Vec<Post>, page: usize, page_size: usize) -> Self {
        let total_posts = all.len();
        let total_pages = total_posts.div_ceil(page_size);
        let page = page.max(1);
        let posts = all
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self {
            posts,
            page,
            total_pages,
            total_posts,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl BlogService {
    /// Every post, newest first.
    pub async fn list_posts(&self) -> BlogResult<Vec<Post>> {
        Ok(queries::list_posts(self.store()).await?)
    }

    /// Page `page` (1-based) of the post list. Page 0 is treated as page 1;
    /// pages past the end are empty.
    pub async fn list_page(&self, page: usize) -> BlogResult<PostPage> {
        let all = queries::list_posts(self.store()).await?;
        Ok(PostPage::slice(all, page, self.page_size))
    }

    pub async fn get_post(&self, id: &str) -> BlogResult<Post> {
        queries::get_post(self.store(), id)
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("post {}", id)))
    }

    /// Publish a new post. Only allow-listed authors may write.
    pub async fn create_post(&self, identity: Option<&Identity>, draft: &PostDraft) -> BlogResult<Post> {
        let identity = require_identity(identity)?;
        if !self.gate.can_author(Some(identity)) {
            return Err(BlogError::PermissionDenied(format!(
                "{} may not write posts",
                identity.email
            )));
        }
        let (title, content) = draft.validated()?;

        let mut author = queries::author_for(self.store(), &identity.uid, identity.to_author()).await?;
        if author.name.trim().is_empty() {
            author.name = DEFAULT_DISPLAY_NAME.to_string();
        }

        let post = queries::insert_post(
            self.store(),
            &NewPost {
                title,
                content,
                author,
            },
        )
        .await?;

        info!(post_id = %post.id, uid = %identity.uid, "Post created");
        Ok(post)
    }

    /// Replace a post's title and content. Only its author may edit it.
    pub async fn update_post(
        &self,
        identity: Option<&Identity>,
        id: &str,
        draft: &PostDraft,
    ) -> BlogResult<Post> {
        let post = self.authorized_post(identity, id).await?;
        let (title, content) = draft.validated()?;

        queries::update_post(self.store(), &post.id, &title, &content).await?;
        info!(post_id = %post.id, "Post updated");
        self.get_post(&post.id).await
    }

    /// Delete a post. Only its author may delete it.
    pub async fn delete_post(&self, identity: Option<&Identity>, id: &str) -> BlogResult<()> {
        let post = self.authorized_post(identity, id).await?;

        queries::delete_post(self.store(), &post.id).await?;
        info!(post_id = %post.id, "Post deleted");
        Ok(())
    }

    /// Whether `identity` may edit or delete the post, for showing controls.
    pub async fn can_edit(&self, identity: Option<&Identity>, id: &str) -> BlogResult<bool> {
        let post = self.get_post(id).await?;
        Ok(self.gate.can_edit_or_delete(identity, &post))
    }

    async fn authorized_post(&self, identity: Option<&Identity>, id: &str) -> BlogResult<Post> {
        let identity = require_identity(identity)?;
        let post = self.get_post(id).await?;
        if !self.gate.can_edit_or_delete(Some(identity), &post) {
            debug!(post_id = %id, uid = %identity.uid, author = %post.author.uid, "Rejected write by non-author");
            return Err(BlogError::PermissionDenied(format!(
                "only the author may change post {}",
                id
            )));
        }
        Ok(post)
    }
}
