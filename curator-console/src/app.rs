//! The console bootstrap: wires the credential store, authenticator,
//! session waiter, guard and router together.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use shared::{
    config::{Config, ConfigError},
    models::{Credentials, LoginFailure, LoginOutcome, Session},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::auth::{Authenticator, SessionWaiter};
use crate::error::ConsoleError;
use crate::guard::{Navigation, NavigationGuard, Router};
use crate::routes::{RouteTable, console_routes};
use crate::store::CredentialStore;

/// Sign-in state of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub project_id: String,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BackendStatus {
    #[must_use]
    pub fn signed_in(&self) -> bool {
        self.email.is_some()
    }
}

/// Snapshot returned by [`Console::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleStatus {
    pub location: String,
    pub backends: Vec<BackendStatus>,
}

/// Application object; build once and share.
#[derive(Debug)]
pub struct Console {
    store: Arc<CredentialStore>,
    authenticator: Authenticator,
    waiter: Arc<SessionWaiter>,
    router: Router,
    home_path: String,
}

impl Console {
    /// Build the console for every configured backend.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ConsoleError> {
        config.validate().map_err(ConfigError::Invalid)?;
        let client = Client::builder()
            .user_agent(concat!("curator-console/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let store = CredentialStore::from_config(config, &client)?;
        Self::new(store, &config.login_path, &config.home_path)
    }

    /// # Errors
    /// Returns an error if the route table cannot be built.
    pub fn new(
        store: CredentialStore,
        login_path: &str,
        home_path: &str,
    ) -> Result<Self, ConsoleError> {
        let routes = Arc::new(RouteTable::new(console_routes(login_path))?);
        let waiter = Arc::new(SessionWaiter::new(store.primary().auth.clone()));
        let guard = NavigationGuard::new(routes, waiter.clone(), login_path);
        let authenticator = Authenticator::new(store.contexts())?;

        Ok(Self {
            store: Arc::new(store),
            authenticator,
            waiter,
            router: Router::new(guard),
            home_path: home_path.to_string(),
        })
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        self.router.guard().routes()
    }

    #[must_use]
    pub fn waiter(&self) -> &SessionWaiter {
        &self.waiter
    }

    /// Kick off every backend's initial load in the background. Navigation
    /// to gated routes waits on it through the session waiter.
    pub fn start(&self) -> JoinHandle<Vec<(String, Option<Session>)>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.restore_all().await })
    }

    /// Sign in to every backend, then move to the home route.
    ///
    /// # Errors
    /// Returns the first backend's rejection; earlier backends stay signed
    /// in.
    #[instrument(skip_all)]
    pub async fn submit_login(&self, credentials: Credentials) -> Result<Navigation, LoginFailure> {
        match self.authenticator.login(credentials).await {
            LoginOutcome::Success(sessions) => {
                info!(backends = sessions.len(), "signed in");
                Ok(self.router.navigate(&self.home_path).await)
            }
            LoginOutcome::Failure(failure) => Err(failure),
        }
    }

    pub async fn navigate(&self, path: &str) -> Navigation {
        self.router.navigate(path).await
    }

    /// Sign out of every backend and return to the login route.
    ///
    /// Returns the names of backends whose sign-out failed.
    pub async fn logout(&self) -> Vec<String> {
        let failed = self.authenticator.sign_out_all().await;
        if !failed.is_empty() {
            warn!(?failed, "some backends did not sign out cleanly");
        }
        let login_path = self.router.guard().login_path().to_string();
        self.router.navigate(&login_path).await;
        failed
    }

    #[must_use]
    pub fn current_location(&self) -> String {
        self.router.current()
    }

    #[must_use]
    pub fn status(&self) -> ConsoleStatus {
        let backends = self
            .store
            .backends()
            .iter()
            .map(|backend| {
                let session = backend.auth.current_session();
                BackendStatus {
                    name: backend.name.clone(),
                    project_id: backend.store.project_id().to_string(),
                    email: session.as_ref().map(|s| s.email.clone()),
                    expires_at: session.map(|s| s.expires_at),
                }
            })
            .collect();

        ConsoleStatus {
            location: self.current_location(),
            backends,
        }
    }
}
