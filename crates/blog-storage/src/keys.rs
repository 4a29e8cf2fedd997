//! Storage key constants.

/// Keys written to local persistence.
pub struct StorageKeys;

impl StorageKeys {
    /// Which provider is active: "none", "google" or "kakao"
    pub const LOGIN_TYPE: &'static str = "loginType";

    /// Cached Google profile (JSON)
    pub const GOOGLE_USER: &'static str = "googleUser";

    /// Cached Kakao profile (JSON)
    pub const KAKAO_USER: &'static str = "kakaoUser";

    /// Every key owned by the session marker.
    pub const SESSION_KEYS: &'static [&'static str] =
        &[Self::LOGIN_TYPE, Self::GOOGLE_USER, Self::KAKAO_USER];
}
