//! One-shot access to "who is signed in", regardless of whether the context
//! has finished its initial load.

use shared::models::Session;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, warn};

use super::context::AuthContext;

/// Coalesces a context's state stream into a single awaited answer.
///
/// Create one per console and share it with the guard. Until the first
/// resolved state is observed every call subscribes on its own; afterwards
/// calls read the context's current session without subscribing.
#[derive(Debug)]
pub struct SessionWaiter {
    context: Arc<dyn AuthContext>,
    initialized: AtomicBool,
}

impl SessionWaiter {
    pub fn new(context: Arc<dyn AuthContext>) -> Self {
        Self {
            context,
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether a resolved state has been observed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The current session, waiting for the initial load if needed.
    ///
    /// Never fails: no session and a closed state stream both resolve to
    /// `None`.
    pub async fn wait_for_session(&self) -> Option<Session> {
        if self.is_initialized() {
            return self.context.current_session();
        }

        let mut rx = self.context.subscribe();
        let session = match rx.wait_for(|state| state.is_resolved()).await {
            Ok(state) => state.session().cloned(),
            Err(_) => {
                warn!(
                    backend = self.context.name(),
                    "auth state stream closed before resolving"
                );
                None
            }
        };
        drop(rx);

        self.initialized.store(true, Ordering::Release);
        debug!(
            backend = self.context.name(),
            signed_in = session.is_some(),
            "auth state resolved"
        );
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::test_implementations::{FakeAuthContext, sample_session};
    use futures::FutureExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waits_for_first_state_event() {
        let context = Arc::new(FakeAuthContext::accepting("catalog"));
        let waiter = Arc::new(SessionWaiter::new(context.clone()));

        let task = tokio::spawn({
            let waiter = waiter.clone();
            async move { waiter.wait_for_session().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished(), "resolved before any state event");
        assert!(!waiter.is_initialized());

        let session = sample_session("catalog");
        context.resolve(Some(session.clone()));

        assert_eq!(task.await.unwrap(), Some(session));
        assert!(waiter.is_initialized());
        assert_eq!(context.live_subscribers(), 0, "subscription was dropped");
    }

    #[tokio::test]
    async fn test_initialized_without_session_resolves_on_first_poll() {
        let context = Arc::new(FakeAuthContext::accepting("catalog"));
        context.resolve(None);
        let waiter = SessionWaiter::new(context.clone());

        assert_eq!(waiter.wait_for_session().await, None);
        assert_eq!(context.subscribe_calls(), 1);

        let second = waiter.wait_for_session().now_or_never();
        assert_eq!(second, Some(None));
        assert_eq!(context.subscribe_calls(), 1, "no new subscription");
    }

    #[tokio::test]
    async fn test_initialized_reads_live_session() {
        let context = Arc::new(FakeAuthContext::accepting("catalog"));
        context.resolve(None);
        let waiter = SessionWaiter::new(context.clone());
        assert_eq!(waiter.wait_for_session().await, None);

        context.sign_in("admin@example.com", "pw").await.unwrap();

        let session = waiter.wait_for_session().now_or_never().flatten();
        assert_eq!(session.map(|s| s.uid), Some("catalog".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_callers_each_subscribe_once() {
        let context = Arc::new(FakeAuthContext::accepting("catalog"));
        let waiter = Arc::new(SessionWaiter::new(context.clone()));

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let waiter = waiter.clone();
                tokio::spawn(async move { waiter.wait_for_session().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(context.subscribe_calls(), 3);

        context.resolve(None);
        for task in tasks {
            assert_eq!(task.await.unwrap(), None);
        }
        assert_eq!(context.live_subscribers(), 0);
    }
}
