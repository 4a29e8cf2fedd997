#![allow(dead_code)]

use async_trait::async_trait;
use blog_auth::{
    GoogleAuth, GoogleUser, KakaoClient, KakaoSdk, ProviderError, ProviderResult, SdkCallback,
    SessionReconciler, SessionSnapshot,
};
use blog_documents::{
    Document, DocumentError, DocumentResult, DocumentSnapshot, DocumentStore, MemoryDocumentStore,
};
use blog_storage::{LoginType, MemoryStorage, SessionMarkerStore};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, Notify};

/// How the next popup answers.
pub enum Popup {
    Ready(ProviderResult<GoogleUser>),
    /// Answers when the test sends on the paired channel.
    Gated(oneshot::Receiver<ProviderResult<GoogleUser>>),
}

/// Federated provider double.
pub struct FakeGoogle {
    popups: Mutex<VecDeque<Popup>>,
    current: Mutex<ProviderResult<Option<GoogleUser>>>,
    changes: broadcast::Sender<Option<GoogleUser>>,
    current_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub popup_opened: Notify,
    pub current_user_asked: Notify,
    pub sign_out_calls: AtomicUsize,
    pub fail_sign_out: AtomicBool,
}

impl FakeGoogle {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            popups: Mutex::new(VecDeque::new()),
            current: Mutex::new(Ok(None)),
            changes,
            current_gate: Mutex::new(None),
            popup_opened: Notify::new(),
            current_user_asked: Notify::new(),
            sign_out_calls: AtomicUsize::new(0),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    pub fn queue_popup(&self, popup: Popup) {
        self.popups.lock().push_back(popup);
    }

    /// Queue a popup that waits for the returned sender.
    pub fn queue_gated_popup(&self) -> oneshot::Sender<ProviderResult<GoogleUser>> {
        let (tx, rx) = oneshot::channel();
        self.queue_popup(Popup::Gated(rx));
        tx
    }

    /// Hold the next `current_user` call until the returned sender fires.
    pub fn hold_current_user(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.current_gate.lock() = Some(rx);
        tx
    }

    pub fn set_current(&self, current: ProviderResult<Option<GoogleUser>>) {
        *self.current.lock() = current;
    }

    /// Push a session change to listeners.
    pub fn push(&self, user: Option<GoogleUser>) {
        let _ = self.changes.send(user);
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GoogleAuth for FakeGoogle {
    async fn sign_in_with_popup(&self) -> ProviderResult<GoogleUser> {
        let popup = self.popups.lock().pop_front();
        self.popup_opened.notify_one();

        let result = match popup {
            Some(Popup::Ready(result)) => result,
            Some(Popup::Gated(rx)) => rx.await.unwrap_or(Err(ProviderError::Interrupted)),
            None => Err(ProviderError::Cancelled),
        };
        if let Ok(user) = &result {
            *self.current.lock() = Ok(Some(user.clone()));
        }
        result
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("offline".to_string()));
        }
        *self.current.lock() = Ok(None);
        Ok(())
    }

    async fn current_user(&self) -> ProviderResult<Option<GoogleUser>> {
        let gate = self.current_gate.lock().take();
        self.current_user_asked.notify_one();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.current.lock().clone()
    }

    fn session_changes(&self) -> broadcast::Receiver<Option<GoogleUser>> {
        self.changes.subscribe()
    }
}

/// Kakao SDK double answering synchronously.
#[derive(Default)]
pub struct FakeKakao {
    loaded: AtomicBool,
    initialized: AtomicBool,
    pub script_fails: AtomicBool,
    token: Mutex<Option<String>>,
    profile: Mutex<Option<Value>>,
    login_error: Mutex<Option<Value>>,
    pub logout_calls: AtomicUsize,
}

impl FakeKakao {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile returned by `/v2/user/me`.
    pub fn set_profile(&self, profile: Value) {
        *self.profile.lock() = Some(profile);
    }

    /// Pretend an earlier login left a token behind.
    pub fn set_token(&self, token: &str) {
        *self.token.lock() = Some(token.to_string());
    }

    pub fn fail_login(&self, error: Value) {
        *self.login_error.lock() = Some(error);
    }

    pub fn logouts(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl KakaoSdk for FakeKakao {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn load_script(&self, on_load: SdkCallback<Result<(), String>>) {
        if self.script_fails.load(Ordering::SeqCst) {
            on_load(Err("blocked by content policy".to_string()));
            return;
        }
        self.loaded.store(true, Ordering::SeqCst);
        on_load(Ok(()));
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn init(&self, _app_key: &str) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    fn login(&self, _scope: &str, on_success: SdkCallback<Value>, on_failure: SdkCallback<Value>) {
        if let Some(err) = self.login_error.lock().clone() {
            on_failure(err);
            return;
        }
        *self.token.lock() = Some("kakao-token".to_string());
        on_success(json!({"access_token": "kakao-token", "token_type": "bearer"}));
    }

    fn request_me(&self, on_success: SdkCallback<Value>, on_failure: SdkCallback<Value>) {
        let has_token = self.token.lock().is_some();
        match self.profile.lock().clone() {
            Some(profile) if has_token => on_success(profile),
            _ => on_failure(json!({"code": -401, "msg": "this access token does not exist"})),
        }
    }

    fn access_token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn logout(&self, on_done: SdkCallback<()>) {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        *self.token.lock() = None;
        on_done(());
    }
}

/// Document store where every call fails.
pub struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn get_document(&self, _collection: &str, _id: &str) -> DocumentResult<Option<Document>> {
        Err(DocumentError::Unavailable("offline".to_string()))
    }

    async fn set_document(&self, _collection: &str, _id: &str, _fields: Document) -> DocumentResult<()> {
        Err(DocumentError::Unavailable("offline".to_string()))
    }

    async fn update_document(&self, _collection: &str, _id: &str, _fields: Document) -> DocumentResult<()> {
        Err(DocumentError::Unavailable("offline".to_string()))
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> DocumentResult<()> {
        Err(DocumentError::Unavailable("offline".to_string()))
    }

    async fn add_document(&self, _collection: &str, _fields: Document) -> DocumentResult<String> {
        Err(DocumentError::Unavailable("offline".to_string()))
    }

    async fn list_documents(&self, _collection: &str) -> DocumentResult<Vec<DocumentSnapshot>> {
        Err(DocumentError::Unavailable("offline".to_string()))
    }
}

/// Reconciler wired to fakes, with handles to each of them.
pub struct Harness {
    pub google: Arc<FakeGoogle>,
    pub kakao: Arc<FakeKakao>,
    pub storage: Arc<MemoryStorage>,
    pub store: Arc<MemoryDocumentStore>,
    pub reconciler: Arc<SessionReconciler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// Harness over pre-populated local storage.
    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        Self::build(storage, store.clone(), store)
    }

    /// Harness whose reconciler talks to `documents` instead of the memory store.
    pub fn with_documents(documents: Arc<dyn DocumentStore>) -> Self {
        Self::build(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryDocumentStore::new()),
            documents,
        )
    }

    fn build(
        storage: Arc<MemoryStorage>,
        store: Arc<MemoryDocumentStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let google = Arc::new(FakeGoogle::new());
        let kakao = Arc::new(FakeKakao::new());
        let client = KakaoClient::with_settings(
            kakao.clone(),
            Some("test-js-key".to_string()),
            "profile_nickname, account_email",
            Duration::from_millis(200),
        );
        let reconciler = Arc::new(SessionReconciler::new(
            google.clone(),
            client,
            documents,
            SessionMarkerStore::new(Box::new(storage.clone())),
        ));

        Self {
            google,
            kakao,
            storage,
            store,
            reconciler,
        }
    }

    /// Independent view of the persisted marker.
    pub fn markers(&self) -> SessionMarkerStore {
        SessionMarkerStore::new(Box::new(self.storage.clone()))
    }

    pub fn marker_login_type(&self) -> LoginType {
        self.markers()
            .load()
            .expect("marker should load")
            .map(|m| m.login_type)
            .unwrap_or(LoginType::None)
    }

    /// Checks the invariants that hold whenever no operation is in flight.
    pub fn assert_settled(&self) {
        let snapshot = self.reconciler.snapshot();
        assert_consistent(&snapshot);
        assert!(!snapshot.is_loading(), "expected a settled session: {:?}", snapshot);
        assert!(!snapshot.provisional);
        assert_eq!(
            self.marker_login_type(),
            snapshot.login_type(),
            "marker must follow the session"
        );
    }
}

/// Identity present exactly when a provider is recorded.
pub fn assert_consistent(snapshot: &SessionSnapshot) {
    assert_eq!(
        snapshot.identity().is_some(),
        snapshot.login_type() != LoginType::None,
        "identity and login type disagree: {:?}",
        snapshot
    );
}

pub fn google_user(uid: &str, email: &str) -> GoogleUser {
    GoogleUser {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: Some(format!("{} name", uid)),
        photo_url: Some(format!("https://img.example/{}.png", uid)),
    }
}

pub fn kakao_profile(id: u64, nickname: &str) -> Value {
    json!({
        "id": id,
        "kakao_account": {
            "email": format!("{}@kakao.com", nickname),
            "profile": {
                "nickname": nickname,
                "profile_image_url": format!("https://k.img/{}.jpg", id)
            }
        }
    })
}
