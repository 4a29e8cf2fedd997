//! Write permission checks.

use crate::Identity;
use blog_config_and_utils::Config;
use blog_documents::Post;
use std::collections::HashSet;

/// Decides who may author posts and who may change them.
///
/// Authoring is limited to an email allow-list. Editing and deleting are
/// limited to the post's author, matched by uid.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    admin_emails: HashSet<String>,
}

impl PermissionGate {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|e| normalize_email(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.admin_emails)
    }

    /// Whether `identity` may create posts.
    pub fn can_author(&self, identity: Option<&Identity>) -> bool {
        identity
            .map(|i| normalize_email(&i.email))
            .filter(|email| !email.is_empty())
            .is_some_and(|email| self.admin_emails.contains(&email))
    }

    /// Whether `identity` may edit or delete `post`.
    pub fn can_edit_or_delete(&self, identity: Option<&Identity>, post: &Post) -> bool {
        identity.is_some_and(|i| !i.uid.is_empty() && i.uid == post.author.uid)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_documents::Author;
    use chrono::Utc;

    fn identity(uid: &str, email: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: String::new(),
            photo_url: String::new(),
        }
    }

    fn post_by(uid: &str) -> Post {
        Post {
            id: "p1".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            author: Author {
                uid: uid.to_string(),
                email: String::new(),
                photo_url: String::new(),
                name: String::new(),
            },
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_can_author_checks_allow_list() {
        let gate = PermissionGate::new(["admin@gmail.com", "boss@kakao.com"]);

        assert!(gate.can_author(Some(&identity("1", "admin@gmail.com"))));
        assert!(gate.can_author(Some(&identity("2", "boss@kakao.com"))));
        assert!(gate.can_author(Some(&identity("1", " Admin@Gmail.com "))));
        assert!(!gate.can_author(Some(&identity("3", "reader@gmail.com"))));
        assert!(!gate.can_author(Some(&identity("4", ""))));
        assert!(!gate.can_author(None));
    }

    #[test]
    fn test_empty_allow_list_entries_never_match() {
        let gate = PermissionGate::new(["", "  "]);
        assert!(!gate.can_author(Some(&identity("1", ""))));
    }

    #[test]
    fn test_can_edit_or_delete_requires_author_uid() {
        let gate = PermissionGate::new(["admin@gmail.com"]);
        let post = post_by("author-uid");

        assert!(gate.can_edit_or_delete(Some(&identity("author-uid", "x@y.com")), &post));
        // Admin status does not grant edit rights on someone else's post
        assert!(!gate.can_edit_or_delete(Some(&identity("other", "admin@gmail.com")), &post));
        assert!(!gate.can_edit_or_delete(None, &post));
    }

    #[test]
    fn test_from_config_uses_defaults() {
        let gate = PermissionGate::from_config(&Config::default());
        assert!(gate.can_author(Some(&identity("1", "mirrol33@gmail.com"))));
        assert!(gate.can_author(Some(&identity("2", "mirrol@kakao.com"))));
    }
}
