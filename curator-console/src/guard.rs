//! Navigation guard and the router that applies it to every transition.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument};

use crate::auth::SessionWaiter;
use crate::routes::{RouteMatch, RouteTable, normalize_path};

/// Decision for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Proceed. `matched` is `None` for paths outside the route table.
    Allow { matched: Option<RouteMatch> },
    /// Go to `to` instead; the requested destination is dropped.
    Redirect { to: String },
}

impl Navigation {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Before-each hook: gated routes need a session from the primary backend.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    routes: Arc<RouteTable>,
    waiter: Arc<SessionWaiter>,
    login_path: String,
}

impl NavigationGuard {
    pub fn new(routes: Arc<RouteTable>, waiter: Arc<SessionWaiter>, login_path: &str) -> Self {
        Self {
            routes,
            waiter,
            login_path: normalize_path(login_path),
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide whether navigation to `to` may proceed. Never fails.
    #[instrument(skip(self))]
    pub async fn before_each(&self, to: &str) -> Navigation {
        let matched = self.routes.resolve(to);
        if !matched.as_ref().is_some_and(|m| m.requires_auth) {
            return Navigation::Allow { matched };
        }

        if self.waiter.wait_for_session().await.is_some() {
            debug!("session present");
            Navigation::Allow { matched }
        } else {
            info!(redirect = %self.login_path, "no session for gated route");
            Navigation::Redirect {
                to: self.login_path.clone(),
            }
        }
    }
}

/// Holds the current location and runs the guard on every `navigate`.
#[derive(Debug)]
pub struct Router {
    guard: NavigationGuard,
    current: Mutex<String>,
}

impl Router {
    pub fn new(guard: NavigationGuard) -> Self {
        Self {
            guard,
            current: Mutex::new(String::new()),
        }
    }

    #[must_use]
    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Current location; empty before the first navigation.
    #[must_use]
    pub fn current(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the guard and move to the target, or to the login route on
    /// redirect.
    pub async fn navigate(&self, to: &str) -> Navigation {
        let decision = self.guard.before_each(to).await;
        let location = match &decision {
            Navigation::Allow { .. } => normalize_path(to),
            Navigation::Redirect { to } => to.clone(),
        };
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = location;
        decision
    }
}
