//! End-to-end console flows over fake backends.

use crate::app::Console;
use crate::auth::AuthContext;
use crate::auth::context::test_implementations::{FakeAuthContext, sample_session};
use crate::error::ConsoleError;
use crate::guard::Navigation;
use crate::store::{Backend, CredentialStore, DocumentStore};
use shared::{
    config::{BackendConfig, Config, ConfigError},
    models::{AuthErrorCode, Credentials},
};
use std::sync::Arc;

fn backend(context: &Arc<FakeAuthContext>) -> Backend {
    let name = context.name().to_string();
    let config = BackendConfig {
        project_id: format!("{name}-project"),
        api_key: "key".to_string(),
        ..BackendConfig::named(name.clone())
    };
    Backend {
        name,
        auth: context.clone(),
        store: DocumentStore::from_config(&config).unwrap(),
    }
}

fn console(catalog: &Arc<FakeAuthContext>, resume: &Arc<FakeAuthContext>) -> Console {
    let store = CredentialStore::new(vec![backend(catalog), backend(resume)]).unwrap();
    Console::new(store, "/login", "/").unwrap()
}

#[tokio::test]
async fn test_login_navigates_home() {
    let catalog = Arc::new(FakeAuthContext::accepting("catalog"));
    let resume = Arc::new(FakeAuthContext::accepting("resume"));
    let console = console(&catalog, &resume);
    console.start().await.unwrap();

    assert!(!console.navigate("/cv").await.is_allowed());
    assert_eq!(console.current_location(), "/login");

    let decision = console
        .submit_login(Credentials::new("a@b.com", "secret", false))
        .await
        .unwrap();

    let Navigation::Allow { matched: Some(matched) } = decision else {
        panic!("expected allow, got {decision:?}");
    };
    assert_eq!(matched.name, "dashboard");
    assert_eq!(console.current_location(), "/");
    assert!(console.navigate("/cv").await.is_allowed());
}

#[tokio::test]
async fn test_failed_login_stays_put() {
    let catalog = Arc::new(FakeAuthContext::rejecting(
        "catalog",
        AuthErrorCode::WrongPassword,
    ));
    let resume = Arc::new(FakeAuthContext::accepting("resume"));
    let console = console(&catalog, &resume);
    console.start().await.unwrap();
    console.navigate("/login").await;

    let failure = console
        .submit_login(Credentials::new("a@b.com", "wrongpass", false))
        .await
        .unwrap_err();

    assert_eq!(failure.message, "Invalid password");
    assert_eq!(resume.sign_in_calls(), 0);
    assert_eq!(console.current_location(), "/login");
}

#[tokio::test]
async fn test_restored_session_allows_gated_routes() {
    let catalog = Arc::new(
        FakeAuthContext::accepting("catalog").with_stored_session(sample_session("catalog")),
    );
    let resume = Arc::new(FakeAuthContext::accepting("resume"));
    let console = console(&catalog, &resume);

    let pending = console.navigate("/characters/1");
    let restored = console.start();
    assert!(pending.await.is_allowed());
    restored.await.unwrap();

    let status = console.status();
    assert_eq!(status.location, "/characters/1");
    assert!(status.backends[0].signed_in());
    assert_eq!(status.backends[0].project_id, "catalog-project");
    assert!(!status.backends[1].signed_in());
}

#[tokio::test]
async fn test_logout_returns_to_login() {
    let catalog = Arc::new(FakeAuthContext::accepting("catalog"));
    let resume = Arc::new(FakeAuthContext::accepting("resume"));
    let console = console(&catalog, &resume);
    console.start().await.unwrap();
    console
        .submit_login(Credentials::new("a@b.com", "secret", true))
        .await
        .unwrap();

    assert!(console.logout().await.is_empty());

    assert_eq!(console.current_location(), "/login");
    assert!(console.status().backends.iter().all(|b| !b.signed_in()));
    assert!(!console.navigate("/banners").await.is_allowed());
}

#[test]
fn test_from_config_rejects_invalid_config() {
    let mut config = Config::with_defaults();
    config.login_path = "login".to_string();

    let err = Console::from_config(&config).unwrap_err();
    assert!(matches!(err, ConsoleError::Config(ConfigError::Invalid(_))));
}
