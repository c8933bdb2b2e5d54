use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Fallback shown for any code without a dedicated message.
pub const GENERIC_SIGN_IN_MESSAGE: &str = "An error occurred during sign in";

/// Normalized authentication error codes reported by a backend.
///
/// Codes use the kebab-case form (`user-not-found`); the `auth/` prefix and
/// the raw Identity Toolkit strings (`EMAIL_NOT_FOUND`) are accepted when
/// parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidEmail,
    UserDisabled,
    TooManyRequests,
    InvalidCredential,
    NetworkRequestFailed,
    Other(String),
}

impl AuthErrorCode {
    /// Return the canonical kebab-case code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserNotFound => "user-not-found",
            Self::WrongPassword => "wrong-password",
            Self::InvalidEmail => "invalid-email",
            Self::UserDisabled => "user-disabled",
            Self::TooManyRequests => "too-many-requests",
            Self::InvalidCredential => "invalid-credential",
            Self::NetworkRequestFailed => "network-request-failed",
            Self::Other(code) => code,
        }
    }

    /// Map an Identity Toolkit error string (`EMAIL_NOT_FOUND`,
    /// `TOO_MANY_ATTEMPTS_TRY_LATER : ...`) onto a code.
    #[must_use]
    pub fn from_identity_toolkit(message: &str) -> Self {
        let reason = message.split(" : ").next().unwrap_or(message).trim();
        match reason {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidCredential,
            other => Self::Other(other.to_string()),
        }
    }

    /// The fixed user-facing message for this code.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UserNotFound => "No account found with this email",
            Self::WrongPassword => "Invalid password",
            Self::InvalidEmail => "Invalid email address",
            Self::UserDisabled => "This account has been disabled",
            Self::TooManyRequests => "Too many failed attempts. Please try again later",
            _ => GENERIC_SIGN_IN_MESSAGE,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let code = value.strip_prefix("auth/").unwrap_or(value);
        Ok(match code {
            "user-not-found" => Self::UserNotFound,
            "wrong-password" => Self::WrongPassword,
            "invalid-email" => Self::InvalidEmail,
            "user-disabled" => Self::UserDisabled,
            "too-many-requests" => Self::TooManyRequests,
            "invalid-credential" => Self::InvalidCredential,
            "network-request-failed" => Self::NetworkRequestFailed,
            other => Self::from_identity_toolkit(other),
        })
    }
}

impl From<String> for AuthErrorCode {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(code) => code,
            Err(never) => match never {},
        }
    }
}

impl From<AuthErrorCode> for String {
    fn from(code: AuthErrorCode) -> Self {
        code.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_message_table() {
        let table = [
            ("user-not-found", "No account found with this email"),
            ("wrong-password", "Invalid password"),
            ("invalid-email", "Invalid email address"),
            ("user-disabled", "This account has been disabled"),
            (
                "too-many-requests",
                "Too many failed attempts. Please try again later",
            ),
        ];

        for (code, message) in table {
            let parsed: AuthErrorCode = code.parse().unwrap();
            assert_eq!(parsed.user_message(), message, "code {code}");
        }
    }

    #[test]
    fn test_unrecognized_code_uses_generic_message() {
        let code: AuthErrorCode = "quota-exceeded".parse().unwrap();
        assert_eq!(code, AuthErrorCode::Other("quota-exceeded".to_string()));
        assert_eq!(code.user_message(), GENERIC_SIGN_IN_MESSAGE);

        assert_eq!(
            AuthErrorCode::InvalidCredential.user_message(),
            "An error occurred during sign in"
        );
        assert_eq!(
            AuthErrorCode::NetworkRequestFailed.user_message(),
            GENERIC_SIGN_IN_MESSAGE
        );
    }

    #[test]
    fn test_auth_prefix_is_accepted() {
        let code: AuthErrorCode = "auth/wrong-password".parse().unwrap();
        assert_eq!(code, AuthErrorCode::WrongPassword);
    }

    #[test]
    fn test_identity_toolkit_strings() {
        assert_eq!(
            AuthErrorCode::from_identity_toolkit("EMAIL_NOT_FOUND"),
            AuthErrorCode::UserNotFound
        );
        assert_eq!(
            AuthErrorCode::from_identity_toolkit("INVALID_PASSWORD"),
            AuthErrorCode::WrongPassword
        );
        assert_eq!(
            AuthErrorCode::from_identity_toolkit(
                "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"
            ),
            AuthErrorCode::TooManyRequests
        );
        assert_eq!(
            AuthErrorCode::from_identity_toolkit("INVALID_LOGIN_CREDENTIALS"),
            AuthErrorCode::InvalidCredential
        );
        assert_eq!(
            AuthErrorCode::from_identity_toolkit("OPERATION_NOT_ALLOWED"),
            AuthErrorCode::Other("OPERATION_NOT_ALLOWED".to_string())
        );
    }

    #[test]
    fn test_display_and_serde_use_canonical_code() {
        assert_eq!(AuthErrorCode::UserDisabled.to_string(), "user-disabled");

        let json = serde_json::to_string(&AuthErrorCode::TooManyRequests).unwrap();
        assert_eq!(json, "\"too-many-requests\"");

        let back: AuthErrorCode = serde_json::from_str("\"USER_DISABLED\"").unwrap();
        assert_eq!(back, AuthErrorCode::UserDisabled);
    }
}
