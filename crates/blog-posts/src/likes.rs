//! Likes by the signed-in user.

use crate::service::require_identity;
use crate::{BlogResult, BlogService};
use blog_auth::Identity;
use blog_documents::{queries, Post};
use tracing::debug;

impl BlogService {
    /// Whether the user has liked the post. Anonymous users have liked nothing.
    pub async fn is_liked(&self, identity: Option<&Identity>, post_id: &str) -> BlogResult<bool> {
        let Some(identity) = identity else {
            return Ok(false);
        };
        Ok(queries::get_like(self.store(), &identity.uid, post_id)
            .await?
            .is_some())
    }

    /// Like or unlike a post. Returns whether the post is liked afterwards.
    pub async fn toggle_like(&self, identity: Option<&Identity>, post_id: &str) -> BlogResult<bool> {
        let identity = require_identity(identity)?;

        if queries::get_like(self.store(), &identity.uid, post_id)
            .await?
            .is_some()
        {
            queries::delete_like(self.store(), &identity.uid, post_id).await?;
            debug!(uid = %identity.uid, post_id, "Post unliked");
            return Ok(false);
        }

        // Only existing posts can be liked
        self.get_post(post_id).await?;
        queries::insert_like(self.store(), &identity.uid, post_id).await?;
        debug!(uid = %identity.uid, post_id, "Post liked");
        Ok(true)
    }

    /// Ids of every post the user liked, most recent like first.
    pub async fn liked_post_ids(&self, identity: Option<&Identity>) -> BlogResult<Vec<String>> {
        let identity = require_identity(identity)?;
        Ok(queries::likes_for_user(self.store(), &identity.uid)
            .await?
            .into_iter()
            .map(|like| like.post_id)
            .collect())
    }

    /// Posts the user liked, most recent like first. Likes of deleted posts
    /// are skipped.
    pub async fn liked_posts(&self, identity: Option<&Identity>) -> BlogResult<Vec<Post>> {
        let ids = self.liked_post_ids(identity).await?;

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            match queries::get_post(self.store(), &id).await? {
                Some(post) => posts.push(post),
                None => debug!(post_id = %id, "Skipping like of deleted post"),
            }
        }
        Ok(posts)
    }

    /// Remove a like. Removing a like that does not exist succeeds.
    pub async fn remove_like(&self, identity: Option<&Identity>, post_id: &str) -> BlogResult<()> {
        let identity = require_identity(identity)?;
        queries::delete_like(self.store(), &identity.uid, post_id).await?;
        Ok(())
    }
}
