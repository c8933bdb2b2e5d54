use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AuthErrorCode, Persistence, Session};

/// Email/password pair submitted once by the login form.
///
/// Consumed by value so the password does not outlive the attempt.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>, remember: bool) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember,
        }
    }

    /// The persistence mode requested by the "remember me" flag.
    #[must_use]
    pub const fn persistence(&self) -> Persistence {
        Persistence::from_remember(self.remember)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// A session established against one named backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSession {
    pub backend: String,
    pub session: Session,
}

/// Why a login attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailure {
    /// The backend whose sign-in failed.
    pub backend: String,
    /// The normalized error code.
    pub code: AuthErrorCode,
    /// The user-facing message for `code`.
    pub message: String,
}

impl LoginFailure {
    #[must_use]
    pub fn new(backend: impl Into<String>, code: AuthErrorCode) -> Self {
        let message = code.user_message().to_string();
        Self {
            backend: backend.into(),
            code,
            message,
        }
    }
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of signing in against every configured backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Every backend accepted the credentials; sessions are in backend order.
    Success(Vec<BackendSession>),
    /// A backend rejected the credentials. Backends before it stay signed in.
    Failure(LoginFailure),
}

impl LoginOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The user-facing message of a failed attempt.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.message),
        }
    }

    /// The session established against `backend`, if the attempt succeeded.
    #[must_use]
    pub fn session_for(&self, backend: &str) -> Option<&Session> {
        match self {
            Self::Success(sessions) => sessions
                .iter()
                .find(|entry| entry.backend == backend)
                .map(|entry| &entry.session),
            Self::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("a@b.com", "hunter2", true);
        let debug = format!("{credentials:?}");

        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(credentials.persistence(), Persistence::Durable);
    }

    #[test]
    fn test_login_failure_uses_table_message() {
        let failure = LoginFailure::new("catalog", AuthErrorCode::WrongPassword);
        assert_eq!(failure.message, "Invalid password");
        assert_eq!(failure.to_string(), "Invalid password");

        let outcome = LoginOutcome::Failure(failure);
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), Some("Invalid password"));
        assert!(outcome.session_for("catalog").is_none());
    }

    #[test]
    fn test_success_lookup_by_backend() {
        let session = Session {
            uid: "u".to_string(),
            email: "a@b.com".to_string(),
            id_token: "i".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now(),
        };
        let outcome = LoginOutcome::Success(vec![BackendSession {
            backend: "resume".to_string(),
            session: session.clone(),
        }]);

        assert!(outcome.is_success());
        assert_eq!(outcome.message(), None);
        assert_eq!(outcome.session_for("resume"), Some(&session));
        assert!(outcome.session_for("catalog").is_none());
    }
}
