pub mod errors;
pub mod login;
pub mod session;

pub use errors::{AuthErrorCode, GENERIC_SIGN_IN_MESSAGE};
pub use login::{BackendSession, Credentials, LoginFailure, LoginOutcome};
pub use session::{AuthState, Persistence, Session};
