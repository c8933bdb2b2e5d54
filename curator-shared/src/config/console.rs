use serde::{Deserialize, Serialize};
use std::{collections::HashSet, env, fmt, fs, path::PathBuf};
use thiserror::Error;
use url::Url;

const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1/";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1/";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported configuration format. Use 'yaml' or 'json'.")]
    UnsupportedFormat,

    #[error("invalid URL for {field}: {source}")]
    Url {
        field: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// One backend project: an authentication context plus a document store.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Short name used in logs, env overrides and session file names.
    pub name: String,

    /// Project identifier of the document store.
    #[serde(default)]
    pub project_id: String,

    /// Web API key sent with every identity request.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the Identity Toolkit API.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Base URL of the Secure Token API used for refreshes.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Base URL of the document store REST API.
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_firestore_url() -> String {
    DEFAULT_FIRESTORE_URL.to_string()
}

impl BackendConfig {
    /// A backend with default endpoints and no credentials.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: String::new(),
            api_key: String::new(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            firestore_url: default_firestore_url(),
        }
    }

    /// Parsed Identity Toolkit base URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::Url`] if `auth_url` is not a valid URL.
    pub fn auth_endpoint(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.auth_url, &format!("{}.auth_url", self.name))
    }

    /// Parsed Secure Token base URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::Url`] if `token_url` is not a valid URL.
    pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.token_url, &format!("{}.token_url", self.name))
    }

    /// Parsed document store base URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::Url`] if `firestore_url` is not a valid URL.
    pub fn firestore_endpoint(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.firestore_url, &format!("{}.firestore_url", self.name))
    }

    /// Prefix for this backend's environment overrides, e.g. `CURATOR_CATALOG_`.
    #[must_use]
    pub fn env_prefix(&self) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("CURATOR_{name}_")
    }

    fn apply_env_overrides(&mut self) {
        let prefix = self.env_prefix();
        if self.project_id.is_empty() {
            if let Ok(project_id) = env::var(format!("{prefix}PROJECT_ID")) {
                self.project_id = project_id;
            }
        }
        if self.api_key.is_empty() {
            if let Ok(api_key) = env::var(format!("{prefix}API_KEY")) {
                self.api_key = api_key;
            }
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("firestore_url", &self.firestore_url)
            .finish()
    }
}

/// Base URLs must end in `/` so relative joins keep their path.
fn parse_base_url(raw: &str, field: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|source| ConfigError::Url {
        field: field.to_string(),
        source,
    })
}

/// The main configuration structure for the Curator console
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Logging level
    pub log_level: String,

    /// Route unauthenticated navigation is redirected to
    pub login_path: String,

    /// Route the console lands on after a successful login
    pub home_path: String,

    /// Directory holding durable sessions; platform config dir when unset
    pub session_dir: Option<PathBuf>,

    /// Backends in sign-in order. The first one gates navigation.
    pub backends: Vec<BackendConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Config {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            log_level: "info".to_string(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
            session_dir: None,
            backends: vec![BackendConfig::named("catalog"), BackendConfig::named("resume")],
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// File values win over environment variables; environment variables only
    /// fill in values that are still at their defaults.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a `.yaml`, `.yml` or `.json` file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or the resolved
    /// configuration fails validation.
    pub fn load_config(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => {
                let content = fs::read_to_string(&path)?;
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("yaml" | "yml") => serde_yml::from_str(&content)?,
                    Some("json") => serde_json::from_str(&content)?,
                    _ => return Err(ConfigError::UnsupportedFormat),
                }
            }
            None => Config::with_defaults(),
        };

        config.apply_env_overrides();
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let defaults = Config::with_defaults();
        if self.log_level == defaults.log_level {
            if let Ok(log_level) = env::var("CURATOR_LOG_LEVEL") {
                self.log_level = log_level;
            }
        }
        if self.login_path == defaults.login_path {
            if let Ok(login_path) = env::var("CURATOR_LOGIN_PATH") {
                self.login_path = login_path;
            }
        }
        if self.session_dir.is_none() {
            if let Ok(session_dir) = env::var("CURATOR_SESSION_DIR") {
                self.session_dir = Some(PathBuf::from(session_dir));
            }
        }
        for backend in &mut self.backends {
            backend.apply_env_overrides();
        }
    }

    /// Directory holding durable session files.
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        if let Some(dir) = &self.session_dir {
            return dir.clone();
        }
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.config_dir().join("curator").join("sessions");
        }
        PathBuf::from("./.curator/sessions")
    }

    /// Look up a backend by name.
    #[must_use]
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|backend| backend.name == name)
    }

    /// Validate the complete configuration
    ///
    /// # Errors
    /// Returns every problem found, one message per problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.login_path.starts_with('/') {
            errors.push(format!(
                "Login path must start with '/': {}",
                self.login_path
            ));
        }
        if !self.home_path.starts_with('/') {
            errors.push(format!("Home path must start with '/': {}", self.home_path));
        }
        if self.backends.is_empty() {
            errors.push("At least one backend must be configured.".to_string());
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if backend.name.trim().is_empty() {
                errors.push("Backend name must not be empty.".to_string());
                continue;
            }
            if !seen.insert(backend.name.as_str()) {
                errors.push(format!("Duplicate backend name: {}", backend.name));
            }
            if backend.project_id.trim().is_empty() {
                errors.push(format!(
                    "Backend '{}' is missing a project_id (set {}PROJECT_ID).",
                    backend.name,
                    backend.env_prefix()
                ));
            }
            if backend.api_key.trim().is_empty() {
                errors.push(format!(
                    "Backend '{}' is missing an api_key (set {}API_KEY).",
                    backend.name,
                    backend.env_prefix()
                ));
            }
            for result in [
                backend.auth_endpoint(),
                backend.token_endpoint(),
                backend.firestore_endpoint(),
            ] {
                if let Err(err) = result {
                    errors.push(err.to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
