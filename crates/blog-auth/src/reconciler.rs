//! Session reconciliation across the two identity providers.
//!
//! [`SessionReconciler`] owns the single answer to "who is signed in". It
//! restores a persisted marker on startup, drives interactive sign-in and
//! sign-out, and follows the federated provider's pushed session changes.
//!
//! Every state change replaces one [`SessionSnapshot`] under a lock, so
//! readers never observe an identity without its provider. Each replacement
//! bumps an epoch; async work captures the epoch it started from and drops
//! its result if anything else changed the session in the meantime.

use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionPhase};
use crate::{
    AuthError, AuthResult, GoogleAuth, GoogleUser, Identity, KakaoClient, Provider, Session,
};
use blog_documents::{queries, DocumentStore};
use blog_storage::{CachedIdentity, LoginType, PersistedSessionMarker, SessionMarkerStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Callback type for session change notifications.
pub type SessionCallback = Box<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub phase: SessionPhase,
    /// True while the identity comes from the local cache and has not been
    /// confirmed by its provider yet.
    pub provisional: bool,
}

impl SessionSnapshot {
    fn anonymous() -> Self {
        Self {
            session: Session::Anonymous,
            phase: SessionPhase::Anonymous,
            provisional: false,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn login_type(&self) -> LoginType {
        self.session.login_type()
    }

    /// Whether an operation is still settling the session.
    pub fn is_loading(&self) -> bool {
        self.phase.is_transient()
    }
}

/// What happened to the user profile document during sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileBootstrap {
    /// First sign-in; the profile was created.
    Created,
    /// The profile already existed and was left alone.
    Existing,
    /// The store failed. The session is active but has no profile yet.
    Degraded,
}

/// Result of [`SessionReconciler::sign_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn {
        identity: Identity,
        profile: ProfileBootstrap,
    },
    /// The same provider was already signed in.
    AlreadySignedIn(Identity),
    /// A sign-out or newer attempt won while the provider was answering.
    /// The late result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy)]
enum MarkerUpdate {
    Keep,
    Write,
    Clear,
}

/// One snapshot replacement.
struct Step {
    input: SessionMachineInput,
    session: Session,
    pending: Option<Provider>,
    provisional: bool,
    marker: MarkerUpdate,
    guard: Option<u64>,
}

impl Step {
    fn new(input: SessionMachineInput, session: Session) -> Self {
        let pending = session.provider();
        Self {
            input,
            session,
            pending,
            provisional: false,
            marker: MarkerUpdate::Keep,
            guard: None,
        }
    }

    fn pending(mut self, provider: Provider) -> Self {
        self.pending = Some(provider);
        self
    }

    /// Mark the identity as not yet confirmed by its provider.
    fn provisional(mut self, provisional: bool) -> Self {
        self.provisional = provisional;
        self
    }

    fn marker(mut self, marker: MarkerUpdate) -> Self {
        self.marker = marker;
        self
    }

    /// Only apply if the epoch is still `epoch`.
    fn guarded(mut self, epoch: u64) -> Self {
        self.guard = Some(epoch);
        self
    }
}

/// Session a pending sign-in started from.
struct Resume {
    snapshot: SessionSnapshot,
    provider: Option<Provider>,
    epoch: u64,
}

struct Inner {
    fsm: SessionMachine,
    snapshot: SessionSnapshot,
    epoch: u64,
    /// Provider behind the current phase: the one being restored, signed
    /// into, or already active.
    provider: Option<Provider>,
    /// Provider whose in-flight sign-in was cancelled by a sign-out.
    abandoned: Option<Provider>,
    /// Where a pending sign-in goes back to if it fails.
    resume: Option<Resume>,
}

impl Inner {
    fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.fsm.state())
    }
}

/// Reconciles provider sessions into one observable session.
pub struct SessionReconciler {
    google: Arc<dyn GoogleAuth>,
    kakao: KakaoClient,
    store: Arc<dyn DocumentStore>,
    markers: SessionMarkerStore,
    inner: Mutex<Inner>,
    watch_tx: watch::Sender<SessionSnapshot>,
    state_callback: Mutex<Option<SessionCallback>>,
}

impl SessionReconciler {
    pub fn new(
        google: Arc<dyn GoogleAuth>,
        kakao: KakaoClient,
        store: Arc<dyn DocumentStore>,
        markers: SessionMarkerStore,
    ) -> Self {
        let (watch_tx, _) = watch::channel(SessionSnapshot::anonymous());
        Self {
            google,
            kakao,
            store,
            markers,
            inner: Mutex::new(Inner {
                fsm: SessionMachine::new(),
                snapshot: SessionSnapshot::anonymous(),
                epoch: 0,
                provider: None,
                abandoned: None,
                resume: None,
            }),
            watch_tx,
            state_callback: Mutex::new(None),
        }
    }

    /// Set a callback to be notified of every snapshot replacement.
    pub fn set_state_callback(&self, callback: SessionCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot.clone()
    }

    pub fn session(&self) -> Session {
        self.inner.lock().snapshot.session.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.lock().snapshot.identity().cloned()
    }

    /// The signed-in identity, or `NotSignedIn` for anonymous and
    /// provisional sessions.
    pub fn require_identity(&self) -> AuthResult<Identity> {
        let inner = self.inner.lock();
        if inner.snapshot.provisional {
            return Err(AuthError::NotSignedIn);
        }
        inner
            .snapshot
            .identity()
            .cloned()
            .ok_or(AuthError::NotSignedIn)
    }

    pub fn login_type(&self) -> LoginType {
        self.inner.lock().snapshot.login_type()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().phase()
    }

    /// The marker as currently persisted.
    pub fn persisted_marker(&self) -> AuthResult<Option<PersistedSessionMarker>> {
        Ok(self.markers.load()?)
    }

    // ==========================================
    // State transitions
    // ==========================================

    /// Apply a step while holding the lock. The caller must pass the
    /// returned snapshot to [`notify`](Self::notify) after unlocking.
    fn apply_locked(&self, inner: &mut Inner, step: Step) -> AuthResult<SessionSnapshot> {
        if let Some(expected) = step.guard {
            if inner.epoch != expected {
                return Err(AuthError::StaleSessionResponse);
            }
        }

        let old_phase = inner.phase();
        inner.fsm.consume(&step.input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                step.input,
                inner.fsm.state()
            ))
        })?;

        let phase = inner.phase();
        let provisional = step.provisional && step.session.is_signed_in();
        inner.epoch += 1;
        inner.provider = step.pending;
        inner.snapshot = SessionSnapshot {
            session: step.session,
            phase,
            provisional,
        };

        self.persist_marker(&inner.snapshot.session, step.marker);

        if old_phase != phase {
            debug!(
                old_state = ?old_phase,
                new_state = ?phase,
                login_type = %inner.snapshot.login_type(),
                "Session state transition"
            );
        }

        self.watch_tx.send_replace(inner.snapshot.clone());
        Ok(inner.snapshot.clone())
    }

    fn apply(&self, step: Step) -> AuthResult<u64> {
        let (snapshot, epoch) = {
            let mut inner = self.inner.lock();
            let snapshot = self.apply_locked(&mut inner, step)?;
            (snapshot, inner.epoch)
        };
        self.notify(&snapshot);
        Ok(epoch)
    }

    fn notify(&self, snapshot: &SessionSnapshot) {
        if let Some(callback) = self.state_callback.lock().as_ref() {
            callback(snapshot);
        }
    }

    /// Marker writes never fail the operation; the marker only speeds up the
    /// next restore.
    fn persist_marker(&self, session: &Session, update: MarkerUpdate) {
        let result = match (update, session) {
            (MarkerUpdate::Keep, _) => return,
            (MarkerUpdate::Write, Session::SignedIn { provider, identity }) => self
                .markers
                .save(provider.login_type(), &CachedIdentity::from(identity)),
            (MarkerUpdate::Write, Session::Anonymous) | (MarkerUpdate::Clear, _) => {
                self.markers.clear()
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to update session marker");
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.inner.lock().epoch == epoch
    }

    // ==========================================
    // Restore
    // ==========================================

    /// Restore the persisted session, if any.
    ///
    /// With a cached identity the session is shown provisionally right away
    /// and confirmed (or dropped) once the provider answers. A marker the
    /// provider cannot confirm is cleared.
    ///
    /// A federated marker whose provider reports no session falls back to a
    /// Kakao identity cached next to it. That cache survives when a switch
    /// away from Kakao could not log out, and in storage written by earlier
    /// clients.
    pub async fn restore(&self) -> AuthResult<Session> {
        let marker = match self.markers.load() {
            Ok(Some(marker)) => marker,
            Ok(None) => {
                debug!("No persisted session marker");
                return Ok(self.session());
            }
            Err(e) => {
                warn!(error = %e, "Could not read session marker, starting anonymous");
                return Ok(self.session());
            }
        };
        let Some(provider) = Provider::from_login_type(marker.login_type) else {
            return Ok(self.session());
        };

        let provisional = marker
            .cached_identity
            .map(|cached| Session::signed_in(provider, cached.into()))
            .unwrap_or(Session::Anonymous);

        let (snapshot, epoch) = {
            let mut inner = self.inner.lock();
            if inner.phase() != SessionPhase::Anonymous {
                debug!(phase = ?inner.phase(), "Session already settled, skipping restore");
                return Ok(inner.snapshot.session.clone());
            }
            let snapshot = self.apply_locked(
                &mut inner,
                Step::new(SessionMachineInput::MarkerFound, provisional)
                    .pending(provider)
                    .provisional(true),
            )?;
            (snapshot, inner.epoch)
        };
        self.notify(&snapshot);

        info!(login_type = %provider, provisional = snapshot.provisional, "Restoring persisted session");

        let confirmed = match provider {
            Provider::Google => match self.google.current_user().await {
                Ok(Some(user)) => Some((Provider::Google, Identity::from_google(&user))),
                Ok(None) => {
                    debug!("Federated provider reports no session");
                    self.restore_kakao_fallback().await
                }
                Err(e) => {
                    warn!(error = %e, "Federated provider could not report its session");
                    self.restore_kakao_fallback().await
                }
            },
            Provider::Kakao => self
                .validate_kakao()
                .await
                .map(|identity| (Provider::Kakao, identity)),
        };

        let (input, session, marker) = match confirmed {
            Some((provider, identity)) => (
                SessionMachineInput::RestoreConfirmed,
                Session::signed_in(provider, identity),
                MarkerUpdate::Write,
            ),
            None => (
                SessionMachineInput::RestoreRejected,
                Session::Anonymous,
                MarkerUpdate::Clear,
            ),
        };

        match self.apply(Step::new(input, session.clone()).marker(marker).guarded(epoch)) {
            Ok(_) => {
                let session = self.session();
                info!(login_type = %session.login_type(), "Session restore finished");
                Ok(session)
            }
            Err(AuthError::StaleSessionResponse) => {
                if self.park_restore(epoch, session, marker) {
                    debug!("Restore finished under a pending sign-in");
                } else {
                    debug!("Restore superseded by a newer session change");
                }
                Ok(self.session())
            }
            Err(e) => Err(e),
        }
    }

    /// Hand a restore result to the sign-in that started on top of it, so a
    /// failed attempt falls back to the confirmed session instead of the
    /// provisional one.
    fn park_restore(&self, epoch: u64, session: Session, marker: MarkerUpdate) -> bool {
        let mut inner = self.inner.lock();
        let Some(resume) = inner.resume.as_mut().filter(|resume| resume.epoch == epoch) else {
            return false;
        };

        let phase = if session.is_signed_in() {
            SessionPhase::SignedIn
        } else {
            SessionPhase::Anonymous
        };
        resume.provider = session.provider();
        resume.snapshot = SessionSnapshot {
            session,
            phase,
            provisional: false,
        };
        self.persist_marker(&resume.snapshot.session, marker);
        true
    }

    /// A Kakao session may outlive a federated marker.
    async fn restore_kakao_fallback(&self) -> Option<(Provider, Identity)> {
        match self.markers.cached_identity(LoginType::Kakao) {
            Ok(Some(_)) => self
                .validate_kakao()
                .await
                .map(|identity| (Provider::Kakao, identity)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read cached Kakao identity");
                None
            }
        }
    }

    async fn validate_kakao(&self) -> Option<Identity> {
        if let Err(e) = self.kakao.ensure_ready().await {
            warn!(error = %e, "Kakao SDK unavailable, cannot restore session");
            return None;
        }
        if !self.kakao.has_active_token() {
            debug!("No Kakao access token to restore");
            return None;
        }
        match self.kakao.fetch_profile().await {
            Ok(profile) => Some(Identity::from_kakao(&profile)),
            Err(e) => {
                warn!(error = %e, "Kakao rejected the stored token");
                None
            }
        }
    }

    // ==========================================
    // Sign-in / sign-out
    // ==========================================

    /// Run the interactive login for `provider`.
    ///
    /// The current session stays in place while the provider answers. Once
    /// it succeeds any session with the other provider is signed out, the
    /// user profile is bootstrapped, the session becomes active and the
    /// marker is written. A failed bootstrap does not fail the sign-in.
    ///
    /// A failed login leaves the session, the phase and the marker as they
    /// were before the call.
    pub async fn sign_in(&self, provider: Provider) -> AuthResult<SignInOutcome> {
        let (snapshot, epoch) = {
            let mut inner = self.inner.lock();
            if inner.phase() == SessionPhase::SignedIn && inner.provider == Some(provider) {
                if let Some(identity) = inner.snapshot.identity() {
                    debug!(provider = %provider, "Already signed in");
                    return Ok(SignInOutcome::AlreadySignedIn(identity.clone()));
                }
            }

            let resume = Resume {
                snapshot: inner.snapshot.clone(),
                provider: inner.provider,
                epoch: inner.epoch,
            };
            let snapshot = self.apply_locked(
                &mut inner,
                Step::new(
                    SessionMachineInput::SignInRequested,
                    resume.snapshot.session.clone(),
                )
                .pending(provider)
                .provisional(resume.snapshot.provisional),
            )?;
            if let Some(from) = resume.provider.filter(|from| *from != provider) {
                info!(from = %from, to = %provider, "Switching provider");
            }
            inner.resume = Some(resume);
            inner.abandoned = None;
            (snapshot, inner.epoch)
        };
        self.notify(&snapshot);

        info!(provider = %provider, "Starting interactive sign-in");
        let result = match provider {
            Provider::Google => self
                .google
                .sign_in_with_popup()
                .await
                .map(|user| Identity::from_google(&user)),
            Provider::Kakao => self
                .kakao
                .login()
                .await
                .map(|profile| Identity::from_kakao(&profile)),
        };

        let identity = match result {
            Ok(identity) => identity,
            Err(e) => {
                return match self.resume_after_failed_sign_in(epoch) {
                    Ok(()) => {
                        warn!(provider = %provider, error = %e, "Sign-in failed");
                        Err(e.into())
                    }
                    Err(AuthError::StaleSessionResponse) => {
                        debug!(provider = %provider, error = %e, "Superseded sign-in failed");
                        self.release_abandoned(provider);
                        Ok(SignInOutcome::Superseded)
                    }
                    Err(other) => Err(other),
                };
            }
        };

        // None when the attempt was superseded; otherwise the provider to leave
        let previous = {
            let mut inner = self.inner.lock();
            (inner.epoch == epoch).then(|| {
                inner
                    .resume
                    .take()
                    .and_then(|resume| resume.provider)
                    .filter(|previous| *previous != provider)
            })
        };
        let Some(previous) = previous else {
            return Ok(self.discard_late_sign_in(provider, &identity).await);
        };

        if let Some(previous) = previous {
            if self.provider_sign_out(previous).await {
                if let Err(e) = self.markers.forget(previous.login_type()) {
                    warn!(provider = %previous, error = %e, "Failed to drop cached identity");
                }
            }
        }

        let profile = self.bootstrap_profile(&identity).await;

        match self.apply(
            Step::new(
                SessionMachineInput::SignInSucceeded,
                Session::signed_in(provider, identity.clone()),
            )
            .marker(MarkerUpdate::Write)
            .guarded(epoch),
        ) {
            Ok(_) => {
                info!(provider = %provider, uid = %identity.uid, "Signed in");
                Ok(SignInOutcome::SignedIn { identity, profile })
            }
            Err(AuthError::StaleSessionResponse) => {
                Ok(self.discard_late_sign_in(provider, &identity).await)
            }
            Err(e) => Err(e),
        }
    }

    /// Put back the session a failed sign-in started from, leaving the
    /// marker alone. The epoch rewinds to where the attempt began so a
    /// restore it interrupted can still land.
    fn resume_after_failed_sign_in(&self, epoch: u64) -> AuthResult<()> {
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.epoch != epoch {
                return Err(AuthError::StaleSessionResponse);
            }

            let resume = inner.resume.take().unwrap_or(Resume {
                snapshot: SessionSnapshot::anonymous(),
                provider: None,
                epoch,
            });
            let input = match resume.snapshot.phase {
                SessionPhase::Restoring => SessionMachineInput::SignInFailedWhileRestoring,
                SessionPhase::SignedIn => SessionMachineInput::SignInFailedWhileSignedIn,
                _ => SessionMachineInput::SignInFailed,
            };
            let step = Step {
                pending: resume.provider,
                ..Step::new(input, resume.snapshot.session)
                    .provisional(resume.snapshot.provisional)
                    .guarded(epoch)
            };

            let snapshot = self.apply_locked(&mut inner, step)?;
            inner.epoch = resume.epoch;
            snapshot
        };
        self.notify(&snapshot);
        Ok(())
    }

    async fn bootstrap_profile(&self, identity: &Identity) -> ProfileBootstrap {
        match queries::ensure_user(self.store.as_ref(), &identity.to_new_user()).await {
            Ok((_, true)) => {
                info!(uid = %identity.uid, "Created user profile");
                ProfileBootstrap::Created
            }
            Ok((_, false)) => ProfileBootstrap::Existing,
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "Profile bootstrap failed, continuing sign-in");
                ProfileBootstrap::Degraded
            }
        }
    }

    /// Drop a sign-in result that arrived after its attempt was superseded,
    /// and end the provider session it created unless that provider is in
    /// use again.
    async fn discard_late_sign_in(&self, provider: Provider, identity: &Identity) -> SignInOutcome {
        debug!(provider = %provider, uid = %identity.uid, "Discarding stale sign-in response");

        let in_use = self.inner.lock().provider == Some(provider);
        if !in_use {
            self.provider_sign_out(provider).await;
        }

        self.release_abandoned(provider);
        SignInOutcome::Superseded
    }

    fn release_abandoned(&self, provider: Provider) {
        let mut inner = self.inner.lock();
        if inner.abandoned == Some(provider) {
            inner.abandoned = None;
        }
    }

    /// End the current session. Calling it with no session does nothing.
    ///
    /// A sign-in still waiting on its provider is abandoned; its result is
    /// dropped when it arrives. The session that sign-in started from is
    /// signed out too.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let (snapshot, provider) = {
            let mut inner = self.inner.lock();
            let provider = match inner.phase() {
                SessionPhase::Anonymous | SessionPhase::SigningOut => {
                    debug!("Sign-out with no active session");
                    return Ok(());
                }
                SessionPhase::SigningIn => {
                    inner.abandoned = inner.provider;
                    inner.resume.take().and_then(|resume| resume.provider)
                }
                SessionPhase::Restoring | SessionPhase::SignedIn => inner.provider,
            };
            let snapshot = self.apply_locked(
                &mut inner,
                Step::new(SessionMachineInput::SignOutRequested, Session::Anonymous)
                    .marker(MarkerUpdate::Clear),
            )?;
            (snapshot, provider)
        };
        self.notify(&snapshot);

        if let Some(provider) = provider {
            self.provider_sign_out(provider).await;
        }

        self.apply(Step::new(
            SessionMachineInput::SignOutComplete,
            Session::Anonymous,
        ))?;
        info!("Signed out");
        Ok(())
    }

    /// Returns whether the provider confirmed the sign-out.
    async fn provider_sign_out(&self, provider: Provider) -> bool {
        let result = match provider {
            Provider::Google => self.google.sign_out().await,
            Provider::Kakao => self.kakao.logout().await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(provider = %provider, error = %e, "Provider sign-out failed");
                false
            }
        }
    }

    // ==========================================
    // Federated push
    // ==========================================

    /// Apply a session change pushed by the federated provider.
    ///
    /// The push is authoritative for federated sessions. It never overrides
    /// an active Kakao session or an operation in flight.
    pub fn handle_federated_change(&self, user: Option<GoogleUser>) {
        let snapshot = {
            let mut inner = self.inner.lock();
            let phase = inner.phase();
            let federated = inner.provider == Some(Provider::Google);
            let abandoned = inner.abandoned == Some(Provider::Google);

            let step = match user {
                Some(user)
                    if !abandoned
                        && (phase == SessionPhase::Anonymous
                            || (federated
                                && matches!(
                                    phase,
                                    SessionPhase::SignedIn | SessionPhase::Restoring
                                ))) =>
                {
                    let session = Session::signed_in(Provider::Google, Identity::from_google(&user));
                    if phase == SessionPhase::SignedIn && inner.snapshot.session == session {
                        return;
                    }
                    Step::new(SessionMachineInput::SessionReported, session)
                        .marker(MarkerUpdate::Write)
                }
                None if federated && phase == SessionPhase::SignedIn => {
                    Step::new(SessionMachineInput::SessionEnded, Session::Anonymous)
                        .marker(MarkerUpdate::Clear)
                }
                user => {
                    debug!(
                        phase = ?phase,
                        signed_in = user.is_some(),
                        "Ignoring federated session change"
                    );
                    return;
                }
            };

            match self.apply_locked(&mut inner, step) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(error = %e, "Could not apply federated session change");
                    return;
                }
            }
        };

        info!(login_type = %snapshot.login_type(), "Federated session changed");
        self.notify(&snapshot);
    }

    /// Follow the federated provider's session stream until it closes.
    pub fn spawn_federated_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.google.session_changes();
        let reconciler = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(user) => reconciler.handle_federated_change(user),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Federated session listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Federated session stream closed");
                        break;
                    }
                }
            }
        })
    }
}
