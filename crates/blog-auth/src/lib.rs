//! Session identity for the My Day blog.
//!
//! This crate provides:
//! - A normalized [`Identity`] built from either provider's native profile
//! - The federated ([`GoogleAuth`]) and Kakao ([`KakaoSdk`]) provider contracts
//! - [`SessionReconciler`], which restores, signs in, signs out and follows
//!   pushed session changes, persisting a marker for the next startup
//! - Explicit FSM-based session phase tracking
//! - [`PermissionGate`] for authoring and edit/delete checks

mod error;
mod google;
mod identity;
mod kakao;
mod permission;
mod reconciler;
mod session_fsm;

pub use error::{AuthError, AuthResult, ProviderError, ProviderResult};
pub use google::GoogleAuth;
pub use identity::{
    GoogleUser, Identity, KakaoAccount, KakaoProfile, KakaoUserResponse, Provider, Session,
};
pub use kakao::{KakaoClient, KakaoSdk, SdkCallback};
pub use permission::PermissionGate;
pub use reconciler::{
    ProfileBootstrap, SessionCallback, SessionReconciler, SessionSnapshot, SignInOutcome,
};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase};
