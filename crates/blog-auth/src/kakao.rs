//! Kakao SDK contract and its async adapter.
//!
//! The SDK is a lazily loaded script with a callback API. [`KakaoClient`]
//! turns each callback pair into a single awaitable result, bounds script
//! loading with a timeout and makes sure `init` ran before anything else.

use crate::{KakaoUserResponse, ProviderError, ProviderResult};
use blog_config_and_utils::Config;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// One-shot SDK callback.
pub type SdkCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// The Kakao JavaScript SDK surface the client uses.
///
/// Errors arrive as the SDK's JSON error objects.
pub trait KakaoSdk: Send + Sync {
    /// Whether the SDK script is present.
    fn is_loaded(&self) -> bool;

    /// Inject the SDK script. `on_load` fires once, with an error when the
    /// script fails to load.
    fn load_script(&self, on_load: SdkCallback<Result<(), String>>);

    /// Whether `init` has run.
    fn is_initialized(&self) -> bool;

    /// `Kakao.init(appKey)`.
    fn init(&self, app_key: &str);

    /// `Kakao.Auth.login({ scope, success, fail })`.
    fn login(&self, scope: &str, on_success: SdkCallback<Value>, on_failure: SdkCallback<Value>);

    /// `Kakao.API.request({ url: "/v2/user/me", success, fail })`.
    fn request_me(&self, on_success: SdkCallback<Value>, on_failure: SdkCallback<Value>);

    /// `Kakao.Auth.getAccessToken()`.
    fn access_token(&self) -> Option<String>;

    /// `Kakao.Auth.logout(callback)`.
    fn logout(&self, on_done: SdkCallback<()>);
}

/// Sender shared by a success and a failure callback; the first to fire wins.
struct Completion<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Completion<T> {
    fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    fn complete(&self, value: T) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(value);
        }
    }
}

/// Async wrapper over a [`KakaoSdk`].
#[derive(Clone)]
pub struct KakaoClient {
    sdk: Arc<dyn KakaoSdk>,
    js_key: Option<String>,
    scope: String,
    load_timeout: Duration,
}

impl KakaoClient {
    pub fn new(sdk: Arc<dyn KakaoSdk>, config: &Config) -> Self {
        Self {
            sdk,
            js_key: config.kakao_js_key.clone(),
            scope: config.kakao_scope.clone(),
            load_timeout: config.sdk_load_timeout(),
        }
    }

    pub fn with_settings(
        sdk: Arc<dyn KakaoSdk>,
        js_key: Option<String>,
        scope: impl Into<String>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            sdk,
            js_key,
            scope: scope.into(),
            load_timeout,
        }
    }

    /// Load the script if needed and run `init` once.
    pub async fn ensure_ready(&self) -> ProviderResult<()> {
        if !self.sdk.is_loaded() {
            let (done, rx) = Completion::new();
            self.sdk
                .load_script(Box::new(move |result| done.complete(result)));

            match tokio::time::timeout(self.load_timeout, rx).await {
                Ok(Ok(Ok(()))) => debug!("Kakao SDK script loaded"),
                Ok(Ok(Err(reason))) => {
                    return Err(ProviderError::SdkUnavailable(format!(
                        "script failed to load: {}",
                        reason
                    )))
                }
                Ok(Err(_)) => {
                    return Err(ProviderError::SdkUnavailable(
                        "script loader went away".to_string(),
                    ))
                }
                Err(_) => {
                    return Err(ProviderError::SdkUnavailable(format!(
                        "script not loaded after {:?}",
                        self.load_timeout
                    )))
                }
            }
        }

        if !self.sdk.is_initialized() {
            let key = self
                .js_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| ProviderError::SdkUnavailable("no JavaScript key configured".to_string()))?;
            self.sdk.init(key);
            if !self.sdk.is_initialized() {
                return Err(ProviderError::SdkUnavailable("init did not take effect".to_string()));
            }
            debug!("Kakao SDK initialized");
        }

        Ok(())
    }

    /// Interactive login followed by a profile fetch.
    pub async fn login(&self) -> ProviderResult<KakaoUserResponse> {
        self.ensure_ready().await?;

        let (done, rx) = Completion::new();
        let on_failure = done.clone();
        self.sdk.login(
            &self.scope,
            Box::new(move |auth| done.complete(Ok(auth))),
            Box::new(move |err| on_failure.complete(Err(err))),
        );

        match rx.await {
            Ok(Ok(_auth)) => {}
            Ok(Err(err)) => return Err(login_error(&err)),
            Err(_) => return Err(ProviderError::Interrupted),
        }

        self.fetch_profile().await
    }

    /// Fetch the current user's profile with the stored token.
    pub async fn fetch_profile(&self) -> ProviderResult<KakaoUserResponse> {
        let (done, rx) = Completion::new();
        let on_failure = done.clone();
        self.sdk.request_me(
            Box::new(move |body| done.complete(Ok(body))),
            Box::new(move |err| on_failure.complete(Err(err))),
        );

        match rx.await {
            Ok(Ok(body)) => serde_json::from_value(body)
                .map_err(|e| ProviderError::InvalidProfile(e.to_string())),
            Ok(Err(err)) => Err(ProviderError::Rejected(err.to_string())),
            Err(_) => Err(ProviderError::Interrupted),
        }
    }

    /// Whether the SDK holds an access token from an earlier login.
    pub fn has_active_token(&self) -> bool {
        self.sdk.is_loaded() && self.sdk.is_initialized() && self.sdk.access_token().is_some()
    }

    /// End the SDK session. Without a token there is nothing to end.
    pub async fn logout(&self) -> ProviderResult<()> {
        if !self.has_active_token() {
            debug!("No Kakao token, skipping SDK logout");
            return Ok(());
        }

        let (done, rx) = Completion::new();
        self.sdk.logout(Box::new(move |()| done.complete(())));
        rx.await.map_err(|_| {
            warn!("Kakao logout callback never fired");
            ProviderError::Interrupted
        })
    }
}

/// The SDK reports a closed popup as `{"error": "access_denied"}`.
fn login_error(err: &Value) -> ProviderError {
    match err.get("error").and_then(Value::as_str) {
        Some("access_denied") | Some("user_cancelled") => ProviderError::Cancelled,
        _ => ProviderError::Rejected(err.to_string()),
    }
}
