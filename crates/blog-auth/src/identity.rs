//! Normalized identity and the provider-native shapes it is built from.

use blog_documents::{Author, NewUser};
use blog_storage::{CachedIdentity, LoginType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity provider backing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Federated Google OAuth through the hosted auth service.
    Google,
    /// Kakao JavaScript SDK.
    Kakao,
}

impl Provider {
    pub fn login_type(self) -> LoginType {
        match self {
            Provider::Google => LoginType::Google,
            Provider::Kakao => LoginType::Kakao,
        }
    }

    pub fn from_login_type(login_type: LoginType) -> Option<Self> {
        match login_type {
            LoginType::Google => Some(Provider::Google),
            LoginType::Kakao => Some(Provider::Kakao),
            LoginType::None => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.login_type().as_str())
    }
}

/// Provider-independent description of the signed-in user.
///
/// Missing provider fields become empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: String,
}

impl Identity {
    /// Normalize a federated provider user.
    pub fn from_google(user: &GoogleUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone().unwrap_or_default(),
            display_name: user.display_name.clone().unwrap_or_default(),
            photo_url: user.photo_url.clone().unwrap_or_default(),
        }
    }

    /// Normalize a Kakao profile response. The numeric id becomes the uid.
    pub fn from_kakao(profile: &KakaoUserResponse) -> Self {
        let account = profile.kakao_account.as_ref();
        let kakao_profile = account.and_then(|a| a.profile.as_ref());
        Self {
            uid: profile.id.to_string(),
            email: account.and_then(|a| a.email.clone()).unwrap_or_default(),
            display_name: kakao_profile
                .and_then(|p| p.nickname.clone())
                .unwrap_or_default(),
            photo_url: kakao_profile
                .and_then(|p| p.profile_image_url.clone())
                .unwrap_or_default(),
        }
    }

    /// Name to show for this user, falling back to the email.
    pub fn display_label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.email
        } else {
            &self.display_name
        }
    }

    /// Profile document seeded on first sign-in.
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            uid: self.uid.clone(),
            name: self.display_name.clone(),
            email: self.email.clone(),
            photo_url: self.photo_url.clone(),
        }
    }

    /// Author snapshot used when this user writes a post.
    pub fn to_author(&self) -> Author {
        Author {
            uid: self.uid.clone(),
            email: self.email.clone(),
            photo_url: self.photo_url.clone(),
            name: self.display_name.clone(),
        }
    }
}

impl From<CachedIdentity> for Identity {
    fn from(cached: CachedIdentity) -> Self {
        Self {
            uid: cached.uid,
            email: cached.email,
            display_name: cached.display_name,
            photo_url: cached.photo_url,
        }
    }
}

impl From<&Identity> for CachedIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
        }
    }
}

/// Who, if anyone, is signed in.
///
/// A signed-in session always names its provider, so an identity can never
/// exist without a login type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Session {
    Anonymous,
    SignedIn { provider: Provider, identity: Identity },
}

impl Session {
    pub fn signed_in(provider: Provider, identity: Identity) -> Self {
        Session::SignedIn { provider, identity }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::SignedIn { identity, .. } => Some(identity),
        }
    }

    pub fn provider(&self) -> Option<Provider> {
        match self {
            Session::Anonymous => None,
            Session::SignedIn { provider, .. } => Some(*provider),
        }
    }

    pub fn login_type(&self) -> LoginType {
        self.provider()
            .map(Provider::login_type)
            .unwrap_or(LoginType::None)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Session::SignedIn { .. })
    }
}

/// User object reported by the federated auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// Body of Kakao's `/v2/user/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KakaoUserResponse {
    pub id: u64,
    #[serde(default)]
    pub kakao_account: Option<KakaoAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KakaoAccount {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile: Option<KakaoProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KakaoProfile {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}
