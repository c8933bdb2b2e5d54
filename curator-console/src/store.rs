//! Holder for every backend's authentication context and document store
//! handle. No sign-in or navigation logic lives here.

use futures::future::join_all;
use reqwest::Client;
use shared::{
    config::{BackendConfig, Config, ConfigError},
    models::Session,
};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::auth::{AuthContext, IdentityContext};
use crate::error::ConsoleError;

/// Handle to one backend's document store REST root.
///
/// CRUD views build their requests from these URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStore {
    project_id: String,
    documents_url: Url,
}

impl DocumentStore {
    /// # Errors
    /// Returns [`ConfigError::Url`] if the configured endpoint is invalid.
    pub fn from_config(backend: &BackendConfig) -> Result<Self, ConfigError> {
        let documents_url = backend
            .firestore_endpoint()?
            .join(&format!(
                "./projects/{}/databases/(default)/documents/",
                backend.project_id
            ))
            .map_err(|source| ConfigError::Url {
                field: format!("{}.firestore_url", backend.name),
                source,
            })?;

        Ok(Self {
            project_id: backend.project_id.clone(),
            documents_url,
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn documents_url(&self) -> &Url {
        &self.documents_url
    }

    /// URL of a top-level collection, e.g. `characters`.
    ///
    /// # Errors
    /// Returns an error if `collection` does not form a valid URL path.
    pub fn collection_url(&self, collection: &str) -> Result<Url, url::ParseError> {
        self.documents_url
            .join(&format!("./{}", collection.trim_matches('/')))
    }
}

/// One backend: its authentication context and its document store.
#[derive(Debug, Clone)]
pub struct Backend {
    pub name: String,
    pub auth: Arc<dyn AuthContext>,
    pub store: DocumentStore,
}

/// Ordered set of backends sharing one login.
#[derive(Debug)]
pub struct CredentialStore {
    backends: Vec<Backend>,
}

impl CredentialStore {
    /// # Errors
    /// Returns [`ConsoleError::NoBackends`] if `backends` is empty.
    pub fn new(backends: Vec<Backend>) -> Result<Self, ConsoleError> {
        if backends.is_empty() {
            return Err(ConsoleError::NoBackends);
        }
        Ok(Self { backends })
    }

    /// Build Identity Toolkit contexts and document store handles for every
    /// configured backend, sharing one HTTP client.
    ///
    /// # Errors
    /// Returns an error if a backend's endpoints are invalid or none are
    /// configured.
    pub fn from_config(config: &Config, client: &Client) -> Result<Self, ConsoleError> {
        let session_dir = config.session_dir();
        let backends = config
            .backends
            .iter()
            .map(|backend| {
                let auth = IdentityContext::from_config(backend, &session_dir, client.clone())?;
                Ok(Backend {
                    name: backend.name.clone(),
                    auth: Arc::new(auth),
                    store: DocumentStore::from_config(backend)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Self::new(backends)
    }

    /// Backends in sign-in order.
    #[must_use]
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// The backend whose session gates navigation.
    #[must_use]
    pub fn primary(&self) -> &Backend {
        &self.backends[0]
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|backend| backend.name == name)
    }

    /// Authentication contexts in sign-in order.
    #[must_use]
    pub fn contexts(&self) -> Vec<Arc<dyn AuthContext>> {
        self.backends
            .iter()
            .map(|backend| backend.auth.clone())
            .collect()
    }

    /// Run every context's initial load concurrently.
    pub async fn restore_all(&self) -> Vec<(String, Option<Session>)> {
        let restored = join_all(self.backends.iter().map(|backend| async move {
            (backend.name.clone(), backend.auth.restore().await)
        }))
        .await;

        for (name, session) in &restored {
            info!(backend = %name, signed_in = session.is_some(), "backend ready");
        }
        restored
    }
}
