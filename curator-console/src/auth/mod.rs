//! Backend authentication: the context seam, the Identity Toolkit
//! implementation, durable session storage, the session waiter and the
//! multi-backend authenticator.

pub mod authenticator;
pub mod context;
pub mod identity;
pub mod vault;
pub mod waiter;


pub use authenticator::Authenticator;
pub use context::{AuthContext, AuthError, SessionChannel};
pub use identity::IdentityContext;
pub use vault::{SessionVault, VaultError};
pub use waiter::SessionWaiter;
