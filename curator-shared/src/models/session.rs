use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString, IntoStaticStr};

/// An authenticated-user handle owned by exactly one authentication context.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend-assigned user id.
    pub uid: String,

    /// The email the user signed in with.
    pub email: String,

    /// Short-lived bearer token for document store requests.
    pub id_token: String,

    /// Long-lived token used to mint a new `id_token`.
    pub refresh_token: String,

    /// When `id_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the id token has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the id token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Compute an expiry instant from a lifetime in seconds.
    #[must_use]
    pub fn expiry_from_now(lifetime_secs: i64) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(lifetime_secs)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// How long a signed-in session survives.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Persistence {
    /// Survives process restarts.
    Durable,
    /// Lives only as long as the current process.
    #[default]
    SessionOnly,
}

impl Persistence {
    /// Select the mode from a login form's "remember me" flag.
    #[must_use]
    pub const fn from_remember(remember: bool) -> Self {
        if remember {
            Self::Durable
        } else {
            Self::SessionOnly
        }
    }

    /// Return the canonical string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// What an authentication context currently reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// The initial load has not finished yet.
    #[default]
    Pending,
    /// The context knows whether a user is signed in.
    Resolved(Option<Session>),
}

impl AuthState {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The signed-in session, if resolved and present.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Resolved(session) => session.as_ref(),
            Self::Pending => None,
        }
    }
}
