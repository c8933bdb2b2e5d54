//! The authentication context seam.
//!
//! Each backend project exposes one context. The console only talks to the
//! [`AuthContext`] trait so sign-in ordering, the session waiter and the guard
//! can be exercised against in-memory implementations.

use async_trait::async_trait;
use shared::models::{AuthErrorCode, AuthState, Persistence, Session};
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;

use super::vault::VaultError;

/// Failures reported by an authentication context.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign in rejected: {0}")]
    Rejected(AuthErrorCode),

    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("session vault unavailable: {0}")]
    Vault(#[from] VaultError),
}

impl AuthError {
    /// Normalize the failure into a code for the user-facing message table.
    #[must_use]
    pub fn code(&self) -> AuthErrorCode {
        match self {
            Self::Rejected(code) => code.clone(),
            Self::Transport(err) if err.is_decode() => {
                AuthErrorCode::Other("invalid-response".to_string())
            }
            Self::Transport(_) => AuthErrorCode::NetworkRequestFailed,
            Self::Vault(_) => AuthErrorCode::Other("persistence-unavailable".to_string()),
        }
    }
}

/// One backend's sign-in, sign-out and session state.
#[async_trait]
pub trait AuthContext: Send + Sync + fmt::Debug {
    /// The backend name this context authenticates against.
    fn name(&self) -> &str;

    /// Choose how the next session is persisted.
    ///
    /// # Errors
    /// Returns [`AuthError::Vault`] if stored sessions cannot be migrated.
    async fn set_persistence(&self, mode: Persistence) -> Result<(), AuthError>;

    /// Sign in with email and password.
    ///
    /// # Errors
    /// Returns [`AuthError::Rejected`] with the backend's code, or a transport
    /// or vault failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Drop the current session.
    ///
    /// # Errors
    /// Returns [`AuthError::Vault`] if a durable session cannot be removed.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Run the initial load. Always leaves the state resolved.
    async fn restore(&self) -> Option<Session>;

    /// The session as of now, without waiting for the initial load.
    fn current_session(&self) -> Option<Session>;

    /// Subscribe to state changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// Broadcasts a context's [`AuthState`] to subscribers.
#[derive(Debug)]
pub struct SessionChannel {
    tx: watch::Sender<AuthState>,
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionChannel {
    /// A channel in the [`AuthState::Pending`] state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::Pending);
        Self { tx }
    }

    /// Publish the signed-in session (or its absence).
    pub fn resolve(&self, session: Option<Session>) {
        self.tx.send_replace(AuthState::Resolved(session));
    }

    /// Publish `session` only if nothing has resolved the state yet.
    ///
    /// Returns whether the state was updated.
    pub fn resolve_if_pending(&self, session: Option<Session>) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_resolved() {
                return false;
            }
            *state = AuthState::Resolved(session);
            true
        })
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().session().cloned()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
