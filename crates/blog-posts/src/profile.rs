//! The signed-in user's own profile.

use crate::service::{require_identity, required_field, DEFAULT_DISPLAY_NAME};
use crate::{BlogError, BlogResult, BlogService};
use blog_auth::Identity;
use blog_documents::{queries, ProfileUpdate, UserRecord};
use tracing::info;

impl BlogService {
    /// The stored profile, if one was ever created.
    pub async fn get_profile(&self, identity: Option<&Identity>) -> BlogResult<Option<UserRecord>> {
        let identity = require_identity(identity)?;
        Ok(queries::get_user(self.store(), &identity.uid).await?)
    }

    /// Name to show for the user: stored profile name, then the provider's
    /// display name, then a fixed default.
    pub async fn display_name(&self, identity: &Identity) -> BlogResult<String> {
        let stored = queries::get_user(self.store(), &identity.uid)
            .await?
            .map(|user| user.name)
            .filter(|name| !name.trim().is_empty());

        Ok(stored
            .or_else(|| Some(identity.display_name.clone()).filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()))
    }

    /// Change the user's name and photo URL.
    ///
    /// A profile missing because sign-in could not create it is created here
    /// first.
    pub async fn update_profile(
        &self,
        identity: Option<&Identity>,
        name: &str,
        photo_url: &str,
    ) -> BlogResult<UserRecord> {
        let identity = require_identity(identity)?;
        let name = required_field("name", name)?;

        let (_, created) = queries::ensure_user(self.store(), &identity.to_new_user()).await?;
        if created {
            info!(uid = %identity.uid, "Created missing profile before update");
        }

        queries::update_user_profile(
            self.store(),
            &identity.uid,
            &ProfileUpdate {
                name,
                photo_url: photo_url.trim().to_string(),
            },
        )
        .await?;

        info!(uid = %identity.uid, "Profile updated");
        queries::get_user(self.store(), &identity.uid)
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("profile {}", identity.uid)))
    }
}
