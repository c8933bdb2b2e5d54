//! Curator console core.
//!
//! One identity signs in to several independent backends in order; a
//! navigation guard keeps gated routes behind the primary backend's session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod auth;
pub mod error;
pub mod guard;
pub mod routes;
pub mod store;

#[cfg(test)]
mod app_test;
#[cfg(test)]
mod routes_test;

pub use app::{BackendStatus, Console, ConsoleStatus};
pub use error::ConsoleError;
pub use guard::{Navigation, NavigationGuard, Router};
pub use routes::{AppRoute, RouteDef, RouteMatch, RouteTable, RouteTableError};
pub use store::{Backend, CredentialStore, DocumentStore};
