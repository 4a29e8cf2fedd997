//! Session state machine using rust-fsm.
//!
//! The machine tracks the lifecycle phase; which provider and identity are
//! active lives next to it in the reconciler's snapshot.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐   MarkerFound    ┌─────────────────┐
//! │    Anonymous    │ ───────────────► │    Restoring    │
//! └──┬──────────▲───┘                  └──┬──────────┬───┘
//!    │          │        RestoreRejected  │          │ RestoreConfirmed
//!    │          └─────────────────────────┘          │ SessionReported
//!    │ SignInRequested                               ▼
//!    ▼                                      ┌─────────────────┐
//! ┌─────────────────┐   SignInSucceeded     │    SignedIn     │
//! │    SigningIn    │ ────────────────────► └────────┬────────┘
//! └────────┬────────┘                                │
//!          │ SignOutRequested                        │ SignOutRequested
//!          ▼                                         ▼
//! ┌─────────────────┐   SignOutComplete
//! │   SigningOut    │ ───────────────────► Anonymous
//! └─────────────────┘
//! ```
//!
//! `SessionReported` also moves `Anonymous` straight to `SignedIn` when the
//! federated provider pushes a session nobody asked for, and `SessionEnded`
//! drops `SignedIn` back to `Anonymous` when it revokes one.
//!
//! `SignInRequested` is also accepted from `Restoring` and `SignedIn` (login
//! button while a session is pending or active). A failed attempt returns to
//! the phase it started from: `SignInFailed` to `Anonymous`,
//! `SignInFailedWhileRestoring` to `Restoring`, `SignInFailedWhileSignedIn`
//! to `SignedIn`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Anonymous)

    Anonymous => {
        MarkerFound => Restoring,
        SignInRequested => SigningIn,
        SessionReported => SignedIn
    },
    Restoring => {
        RestoreConfirmed => SignedIn,
        RestoreRejected => Anonymous,
        // Authoritative provider answered before the restore did
        SessionReported => SignedIn,
        // User clicked a login button while the restore was pending
        SignInRequested => SigningIn,
        SignOutRequested => SigningOut
    },
    SigningIn => {
        SignInSucceeded => SignedIn,
        SignInFailed => Anonymous,
        SignInFailedWhileRestoring => Restoring,
        SignInFailedWhileSignedIn => SignedIn,
        SignOutRequested => SigningOut
    },
    SignedIn => {
        // Profile refresh from the same provider
        SessionReported => SignedIn,
        SessionEnded => Anonymous,
        // Switching to the other provider
        SignInRequested => SigningIn,
        SignOutRequested => SigningOut
    },
    SigningOut => {
        SignOutComplete => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Lifecycle phase exposed to presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session.
    Anonymous,
    /// A persisted marker is being confirmed with its provider.
    Restoring,
    /// An interactive login is in flight.
    SigningIn,
    /// A provider-confirmed session is active.
    SignedIn,
    /// The active session is being torn down.
    SigningOut,
}

impl SessionPhase {
    /// Returns true while an operation is pending.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionPhase::Restoring | SessionPhase::SigningIn | SessionPhase::SigningOut
        )
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Anonymous => SessionPhase::Anonymous,
            SessionMachineState::Restoring => SessionPhase::Restoring,
            SessionMachineState::SigningIn => SessionPhase::SigningIn,
            SessionMachineState::SignedIn => SessionPhase::SignedIn,
            SessionMachineState::SigningOut => SessionPhase::SigningOut,
        }
    }
}
