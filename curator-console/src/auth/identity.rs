//! Authentication context backed by the Identity Toolkit REST API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use shared::{
    config::{BackendConfig, ConfigError},
    models::{AuthErrorCode, AuthState, Persistence, Session},
};
use std::{
    fmt,
    path::Path,
    sync::{Mutex, PoisonError},
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::context::{AuthContext, AuthError, SessionChannel};
use super::vault::SessionVault;

/// Lifetime assumed when the backend sends an unparseable `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn lifetime_secs(expires_in: &str) -> i64 {
    expires_in
        .trim()
        .parse()
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

/// Turn a non-success response into a rejection code.
async fn rejection(response: Response) -> AuthError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => AuthError::Rejected(AuthErrorCode::from_identity_toolkit(&body.error.message)),
        Err(_) => AuthError::Rejected(AuthErrorCode::Other(format!("http-{}", status.as_u16()))),
    }
}

/// One backend project's authentication context.
pub struct IdentityContext {
    name: String,
    api_key: String,
    sign_in_url: Url,
    refresh_url: Url,
    client: Client,
    vault: SessionVault,
    persistence: Mutex<Persistence>,
    channel: SessionChannel,
}

impl fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityContext")
            .field("name", &self.name)
            .field("sign_in_url", &self.sign_in_url.as_str())
            .field("refresh_url", &self.refresh_url.as_str())
            .field("vault", &self.vault)
            .field("state", &self.channel.state())
            .finish_non_exhaustive()
    }
}

impl IdentityContext {
    /// Build a context for `backend`, storing durable sessions under
    /// `session_dir`. The state stays pending until [`AuthContext::restore`].
    ///
    /// # Errors
    /// Returns [`ConfigError::Url`] if the configured endpoints are invalid.
    pub fn from_config(
        backend: &BackendConfig,
        session_dir: &Path,
        client: Client,
    ) -> Result<Self, ConfigError> {
        let join = |base: Url, path: &str, field: &str| {
            base.join(path).map_err(|source| ConfigError::Url {
                field: format!("{}.{field}", backend.name),
                source,
            })
        };
        let sign_in_url = join(
            backend.auth_endpoint()?,
            "./accounts:signInWithPassword",
            "auth_url",
        )?;
        let refresh_url = join(backend.token_endpoint()?, "./token", "token_url")?;

        Ok(Self {
            name: backend.name.clone(),
            api_key: backend.api_key.clone(),
            sign_in_url,
            refresh_url,
            client,
            vault: SessionVault::new(session_dir, &backend.name),
            persistence: Mutex::new(Persistence::default()),
            channel: SessionChannel::new(),
        })
    }

    /// The persistence mode the next sign-in will use.
    #[must_use]
    pub fn persistence(&self) -> Persistence {
        *self
            .persistence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn store_persistence(&self, mode: Persistence) {
        *self
            .persistence
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// A sign-in or sign-out already resolved the state, so the initial load
    /// must not touch the session or the vault.
    fn superseded(&self) -> bool {
        self.channel.state().is_resolved()
    }

    #[must_use]
    pub fn vault(&self) -> &SessionVault {
        &self.vault
    }

    /// Exchange the refresh token for a new id token.
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.refresh_url.clone())
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: RefreshResponse = response.json().await?;
        Ok(Session {
            uid: body.user_id,
            email: session.email.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Session::expiry_from_now(lifetime_secs(&body.expires_in)),
        })
    }

    async fn load_stored_session(&self) -> Option<Session> {
        let stored = match self.vault.load().await {
            Ok(stored) => stored?,
            Err(err) => {
                warn!(backend = %self.name, error = %err, "discarding unreadable stored session");
                self.discard_stored().await;
                return None;
            }
        };

        if !stored.is_expired() {
            return Some(stored);
        }

        debug!(backend = %self.name, "stored session expired, refreshing");
        match self.refresh(&stored).await {
            Ok(fresh) => {
                if self.superseded() {
                    return None;
                }
                if let Err(err) = self.vault.save(&fresh).await {
                    warn!(backend = %self.name, error = %err, "could not store refreshed session");
                }
                Some(fresh)
            }
            Err(err) => {
                warn!(backend = %self.name, error = %err, "session refresh failed");
                self.discard_stored().await;
                None
            }
        }
    }

    async fn discard_stored(&self) {
        if self.superseded() {
            debug!(backend = %self.name, "state already resolved, keeping stored session");
            return;
        }
        if let Err(err) = self.vault.clear().await {
            warn!(backend = %self.name, error = %err, "could not remove stored session");
        }
    }
}

#[async_trait]
impl AuthContext for IdentityContext {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_persistence(&self, mode: Persistence) -> Result<(), AuthError> {
        self.store_persistence(mode);
        match mode {
            Persistence::SessionOnly => self.vault.clear().await?,
            Persistence::Durable => {
                if let Some(session) = self.channel.current() {
                    self.vault.save(&session).await?;
                }
            }
        }
        debug!(backend = %self.name, %mode, "persistence updated");
        Ok(())
    }

    #[instrument(skip(self, password), fields(backend = %self.name))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.sign_in_url.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: SignInResponse = response.json().await?;
        let session = Session {
            uid: body.local_id,
            email: body.email,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Session::expiry_from_now(lifetime_secs(&body.expires_in)),
        };

        if self.persistence() == Persistence::Durable {
            if let Err(err) = self.vault.save(&session).await {
                warn!(error = %err, "signed in but could not store durable session");
            }
        }

        self.channel.resolve(Some(session.clone()));
        info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.channel.resolve(None);
        self.vault.clear().await?;
        info!(backend = %self.name, "signed out");
        Ok(())
    }

    async fn restore(&self) -> Option<Session> {
        if let AuthState::Resolved(session) = self.channel.state() {
            return session;
        }

        let restored = self.load_stored_session().await;
        let published = {
            let mut mode = self
                .persistence
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let published = self.channel.resolve_if_pending(restored.clone());
            if published && restored.is_some() {
                *mode = Persistence::Durable;
            }
            published
        };
        if !published {
            debug!(backend = %self.name, "state resolved during initial load, keeping it");
            return self.channel.current();
        }
        debug!(backend = %self.name, signed_in = restored.is_some(), "initial load finished");
        restored
    }

    fn current_session(&self) -> Option<Session> {
        self.channel.current()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.channel.subscribe()
    }
}
