//! Sign one identity in against every backend, in order.

use shared::models::{BackendSession, Credentials, LoginFailure, LoginOutcome};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::context::AuthContext;
use crate::error::ConsoleError;

/// Shares one set of credentials across an ordered list of backends.
///
/// Backends are attempted sequentially; the first rejection ends the attempt
/// and backends already signed in stay signed in.
#[derive(Debug, Clone)]
pub struct Authenticator {
    targets: Vec<Arc<dyn AuthContext>>,
}

impl Authenticator {
    /// # Errors
    /// Returns [`ConsoleError::NoBackends`] if `targets` is empty.
    pub fn new(targets: Vec<Arc<dyn AuthContext>>) -> Result<Self, ConsoleError> {
        if targets.is_empty() {
            return Err(ConsoleError::NoBackends);
        }
        Ok(Self { targets })
    }

    /// Backend names in sign-in order.
    pub fn backend_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|target| target.name())
    }

    #[instrument(skip_all, fields(email = %credentials.email, remember = credentials.remember))]
    pub async fn login(&self, credentials: Credentials) -> LoginOutcome {
        let mode = credentials.persistence();
        let mut sessions = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            let backend = target.name();

            let attempt = match target.set_persistence(mode).await {
                Ok(()) => {
                    target
                        .sign_in(&credentials.email, &credentials.password)
                        .await
                }
                Err(err) => Err(err),
            };

            match attempt {
                Ok(session) => {
                    info!(backend, "backend accepted credentials");
                    sessions.push(BackendSession {
                        backend: backend.to_string(),
                        session,
                    });
                }
                Err(err) => {
                    let failure = LoginFailure::new(backend, err.code());
                    if sessions.is_empty() {
                        warn!(backend, code = %failure.code, error = %err, "sign in rejected");
                    } else {
                        let still_signed_in: Vec<_> =
                            sessions.iter().map(|entry| entry.backend.as_str()).collect();
                        warn!(
                            backend,
                            code = %failure.code,
                            error = %err,
                            ?still_signed_in,
                            "sign in rejected after earlier backends succeeded"
                        );
                    }
                    return LoginOutcome::Failure(failure);
                }
            }
        }

        LoginOutcome::Success(sessions)
    }

    /// Sign out of every backend, continuing past failures.
    ///
    /// Returns the names of backends whose sign-out failed.
    pub async fn sign_out_all(&self) -> Vec<String> {
        let mut failed = Vec::new();
        for target in &self.targets {
            if let Err(err) = target.sign_out().await {
                warn!(backend = target.name(), error = %err, "sign out failed");
                failed.push(target.name().to_string());
            }
        }
        failed
    }
}
