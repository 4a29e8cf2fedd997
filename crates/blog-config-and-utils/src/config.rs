//! Configuration management for the blog client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accounts allowed to write new posts.
pub const DEFAULT_ADMIN_EMAILS: &[&str] = &["mirrol33@gmail.com", "mirrol@kakao.com"];

/// Scopes requested from Kakao during interactive login.
pub const DEFAULT_KAKAO_SCOPE: &str = "profile_nickname, account_email, profile_image";

/// How long to wait for the Kakao SDK script before giving up.
pub const DEFAULT_SDK_LOAD_TIMEOUT_MS: u64 = 10_000;

/// Posts per page in the post list.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Kakao JavaScript key baked in at compile time, if any.
const COMPILE_TIME_KAKAO_JS_KEY: Option<&str> = option_env!("MY_DAY_KAKAO_JS_KEY");

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emails allowed to author posts.
    #[serde(default = "default_admin_emails")]
    pub admin_emails: Vec<String>,
    /// Kakao JavaScript SDK key passed to `Kakao.init`.
    #[serde(default = "default_kakao_js_key")]
    pub kakao_js_key: Option<String>,
    /// Scopes requested during Kakao login.
    #[serde(default = "default_kakao_scope")]
    pub kakao_scope: String,
    /// Kakao SDK script load timeout in milliseconds.
    #[serde(default = "default_sdk_load_timeout_ms")]
    pub sdk_load_timeout_ms: u64,
    /// Posts per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_admin_emails() -> Vec<String> {
    DEFAULT_ADMIN_EMAILS.iter().map(|s| s.to_string()).collect()
}

fn default_kakao_js_key() -> Option<String> {
    COMPILE_TIME_KAKAO_JS_KEY.map(|s| s.to_string())
}

fn default_kakao_scope() -> String {
    DEFAULT_KAKAO_SCOPE.to_string()
}

fn default_sdk_load_timeout_ms() -> u64 {
    DEFAULT_SDK_LOAD_TIMEOUT_MS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            admin_emails: default_admin_emails(),
            kakao_js_key: default_kakao_js_key(),
            kakao_scope: default_kakao_scope(),
            sdk_load_timeout_ms: default_sdk_load_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables are applied on top.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `MY_DAY_*` overrides using the given variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).and_then(non_empty);

        if let Some(level) = lookup("MY_DAY_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(raw) = lookup("MY_DAY_ADMIN_EMAILS") {
            self.admin_emails = raw
                .split(',')
                .filter_map(|email| non_empty(email.to_string()))
                .collect();
        }

        if let Some(key) = lookup("MY_DAY_KAKAO_JS_KEY") {
            self.kakao_js_key = Some(key);
        }

        if let Some(timeout) = lookup("MY_DAY_SDK_LOAD_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.sdk_load_timeout_ms = timeout;
        }
    }

    /// Reject values the rest of the client cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.page_size == 0 {
            return Err(CoreError::Config("page_size must be at least 1".to_string()));
        }
        if self.sdk_load_timeout_ms == 0 {
            return Err(CoreError::Config(
                "sdk_load_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Kakao SDK load timeout as a Duration.
    pub fn sdk_load_timeout(&self) -> Duration {
        Duration::from_millis(self.sdk_load_timeout_ms)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
