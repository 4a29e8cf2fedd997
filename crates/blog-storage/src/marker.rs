//! Persisted session marker.
//!
//! The marker is the `(loginType, cachedIdentity?)` pair written when a
//! session starts. On reload it lets the client show the previous user right
//! away while the provider confirms the session in the background.

use crate::{LocalStorage, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Which provider the persisted session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginType {
    None,
    Google,
    Kakao,
}

impl LoginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginType::None => "none",
            LoginType::Google => "google",
            LoginType::Kakao => "kakao",
        }
    }

    fn cache_key(&self) -> Option<&'static str> {
        match self {
            LoginType::None => None,
            LoginType::Google => Some(StorageKeys::GOOGLE_USER),
            LoginType::Kakao => Some(StorageKeys::KAKAO_USER),
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(LoginType::None),
            "google" => Ok(LoginType::Google),
            "kakao" => Ok(LoginType::Kakao),
            other => Err(StorageError::Encoding(format!(
                "unknown login type: {}",
                other
            ))),
        }
    }
}

/// Denormalized profile snapshot kept next to the login type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedIdentity {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
}

/// The marker as read back from local persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSessionMarker {
    pub login_type: LoginType,
    pub cached_identity: Option<CachedIdentity>,
}

/// High-level API over [`LocalStorage`] for the session marker.
pub struct SessionMarkerStore {
    storage: Box<dyn LocalStorage>,
}

impl SessionMarkerStore {
    pub fn new(storage: Box<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Read the marker. `None` when no provider is recorded.
    ///
    /// An unreadable login type is treated as absent.
    pub fn load(&self) -> StorageResult<Option<PersistedSessionMarker>> {
        let login_type = match self.storage.get(StorageKeys::LOGIN_TYPE)? {
            Some(raw) => match raw.parse::<LoginType>() {
                Ok(login_type) => login_type,
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring unreadable login type marker");
                    return Ok(None);
                }
            },
            None => return Ok(None),
        };

        if login_type == LoginType::None {
            return Ok(None);
        }

        Ok(Some(PersistedSessionMarker {
            login_type,
            cached_identity: self.cached_identity(login_type)?,
        }))
    }

    /// Cached identity for a specific provider, independent of the login type.
    ///
    /// A cached value that no longer parses is removed and reported as absent.
    pub fn cached_identity(&self, login_type: LoginType) -> StorageResult<Option<CachedIdentity>> {
        let Some(key) = login_type.cache_key() else {
            return Ok(None);
        };

        match self.storage.get(key)? {
            Some(json) => match serde_json::from_str::<CachedIdentity>(&json) {
                Ok(identity) => Ok(Some(identity)),
                Err(e) => {
                    warn!(key, error = %e, "Cached identity is corrupt, removing it");
                    self.storage.remove(key)?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Write the marker for `login_type`.
    ///
    /// The other provider's cache is left in place; it goes away with
    /// [`forget`](Self::forget) once that provider is signed out, or with
    /// [`clear`](Self::clear).
    pub fn save(&self, login_type: LoginType, identity: &CachedIdentity) -> StorageResult<()> {
        let Some(key) = login_type.cache_key() else {
            return self.clear();
        };

        let json = serde_json::to_string(identity)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        self.storage.set(key, &json)?;
        self.storage.set(StorageKeys::LOGIN_TYPE, login_type.as_str())?;

        debug!(login_type = %login_type, uid = %identity.uid, "Saved session marker");
        Ok(())
    }

    /// Drop one provider's cached identity. The login type is untouched.
    pub fn forget(&self, login_type: LoginType) -> StorageResult<()> {
        if let Some(key) = login_type.cache_key() {
            if self.storage.remove(key)? {
                debug!(login_type = %login_type, "Dropped cached identity");
            }
        }
        Ok(())
    }

    /// Remove every marker key. Safe to call when nothing is stored.
    pub fn clear(&self) -> StorageResult<()> {
        for key in StorageKeys::SESSION_KEYS {
            self.storage.remove(key)?;
        }
        debug!("Cleared session marker");
        Ok(())
    }
}
