//! Login throttling.

use fieldauth_auth::LoginRequest;
use fieldauth_core::error::ErrorKind;
use fieldauth_core::events::SecurityEventType;

use crate::helpers::{PASSWORD, TestApp};

fn attempt(secret: &str, source: &str) -> LoginRequest {
    LoginRequest::new("mandor1", secret).with_source(source)
}

#[tokio::test]
async fn test_sixth_attempt_limited_without_credential_check() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();

    for _ in 0..5 {
        let result = sessions.login(attempt("wrong", "10.3.0.1")).await.unwrap();
        assert_eq!(result.failure_reason, Some(ErrorKind::InvalidCredentials));
    }

    // With the store down, reaching the credential check would surface
    // StoreUnavailable instead of a limited result.
    app.store.set_available(false);
    let sixth = sessions.login(attempt(PASSWORD, "10.3.0.1")).await.unwrap();
    assert!(!sixth.success);
    assert_eq!(sixth.failure_reason, Some(ErrorKind::RateLimited));
    app.store.set_available(true);

    let still = sessions.login(attempt(PASSWORD, "10.3.0.1")).await.unwrap();
    assert_eq!(still.failure_reason, Some(ErrorKind::RateLimited));

    app.wait_for_event(SecurityEventType::RateLimitExceeded).await;
}

#[tokio::test]
async fn test_limit_is_per_source_address() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();

    for _ in 0..6 {
        sessions.login(attempt("wrong", "10.3.0.1")).await.unwrap();
    }
    let elsewhere = sessions.login(attempt(PASSWORD, "10.3.0.2")).await.unwrap();
    assert!(elsewhere.success);
}

#[tokio::test]
async fn test_success_resets_counter() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();

    for _ in 0..4 {
        sessions.login(attempt("wrong", "10.3.0.1")).await.unwrap();
    }
    assert!(sessions.login(attempt(PASSWORD, "10.3.0.1")).await.unwrap().success);
    for _ in 0..4 {
        sessions.login(attempt("wrong", "10.3.0.1")).await.unwrap();
    }
    assert!(sessions.login(attempt(PASSWORD, "10.3.0.1")).await.unwrap().success);
    assert_eq!(
        sessions
            .limiter()
            .remaining_login_attempts("mandor1", Some("10.3.0.1")),
        5
    );
}
