//! Login, authorize, logout, and password change flows.

use std::sync::Arc;

use async_trait::async_trait;

use fieldauth_auth::{AuthorizationDecision, LoginRequest, SecuritySink, SessionState};
use fieldauth_core::error::{AppError, ErrorKind};
use fieldauth_core::events::{Outcome, SecurityEvent, SecurityEventType};
use fieldauth_core::result::AppResult;

use crate::helpers::{self, PASSWORD, TestApp};

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    let user = app.create_user("manager1", app.manager).await;

    let result = app.login("manager1").await;

    assert_eq!(result.state, SessionState::Authenticated);
    assert_eq!(result.user_id, Some(user));
    let tokens = result.tokens.unwrap();
    assert!(tokens.offline_token.is_none());
    assert_eq!(tokens.expires_in, 15 * 60);

    let permissions = result.effective_permissions.unwrap();
    assert_eq!(permissions.keys(), vec!["harvest:approve", "harvest:read"]);

    let event = app.wait_for_event(SecurityEventType::LoginSuccess).await;
    assert_eq!(event.user_id, Some(user));
    assert_eq!(event.source_addr.as_deref(), Some("10.1.0.1"));
}

#[tokio::test]
async fn test_login_by_email_ignores_case() {
    let app = TestApp::new().await;
    app.create_user("asisten1", app.mandor).await;

    let result = app
        .engine
        .sessions()
        .login(LoginRequest::new("Asisten1@Estate.Example", PASSWORD))
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;

    let wrong_secret = app
        .engine
        .sessions()
        .login(LoginRequest::new("mandor1", "not-the-password"))
        .await
        .unwrap();
    let unknown = app
        .engine
        .sessions()
        .login(LoginRequest::new("nobody", PASSWORD))
        .await
        .unwrap();
    app.store.set_identity_active(user, false);
    let inactive = app
        .engine
        .sessions()
        .login(LoginRequest::new("mandor1", PASSWORD))
        .await
        .unwrap();

    for result in [&wrong_secret, &unknown, &inactive] {
        assert!(!result.success);
        assert_eq!(result.state, SessionState::Anonymous);
        assert_eq!(result.failure_reason, Some(ErrorKind::InvalidCredentials));
        assert!(result.tokens.is_none());
        assert!(result.user_id.is_none());
    }

    let event = app.wait_for_event(SecurityEventType::LoginFailure).await;
    assert_eq!(event.outcome, Outcome::Failure);
}

#[tokio::test]
async fn test_store_outage_is_not_invalid_credentials() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    app.store.set_available(false);

    let err = app
        .engine
        .sessions()
        .login(LoginRequest::new("mandor1", PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreUnavailable);
}

#[tokio::test]
async fn test_mandor1_expired_grant_does_not_authorize() {
    use chrono::{Duration, Utc};
    use fieldauth_entity::rbac::{PermissionKey, UserPermissionOverride};
    use fieldauth_store::RbacStore;

    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let approve_key: PermissionKey = "harvest:approve".parse().unwrap();
    let approve = app
        .store
        .find_permission_by_key(&approve_key)
        .await
        .unwrap()
        .unwrap();
    app.store
        .upsert_override(UserPermissionOverride::grant(
            user,
            approve.id,
            Some(Utc::now() - Duration::days(1)),
        ))
        .await
        .unwrap();

    let access = app.login("mandor1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();

    assert_eq!(
        sessions.authorize(&access, "harvest:approve").await.unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::PermissionDenied
        }
    );
    assert_eq!(
        sessions.authorize(&access, "harvest:read").await.unwrap(),
        AuthorizationDecision::Allowed { user_id: user }
    );

    let event = app.wait_for_event(SecurityEventType::AuthorizationDenied).await;
    assert_eq!(event.user_id, Some(user));
}

#[tokio::test]
async fn test_authorize_rejects_wrong_kind_and_garbage() {
    let app = TestApp::new().await;
    app.create_user("manager1", app.manager).await;
    let tokens = app.login("manager1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    assert_eq!(
        sessions
            .authorize(&tokens.refresh_token, "harvest:read")
            .await
            .unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::WrongKind
        }
    );
    assert_eq!(
        sessions.authorize("not.a.jwt", "harvest:read").await.unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::Malformed
        }
    );
    let err = sessions
        .authorize(&tokens.access_token, "harvest")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_logout_ends_only_that_lineage() {
    let app = TestApp::new().await;
    app.create_user("asisten1", app.mandor).await;
    let phone = app.login("asisten1").await.tokens.unwrap();
    let laptop = app.login("asisten1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    let result = sessions.logout(&phone.access_token).await.unwrap();
    assert!(result.success);
    assert_eq!(result.state, SessionState::Anonymous);

    assert_eq!(
        sessions
            .authorize(&phone.access_token, "harvest:read")
            .await
            .unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::Revoked
        }
    );
    let refreshed = sessions.refresh(&phone.refresh_token).await.unwrap();
    assert_eq!(refreshed.failure_reason, Some(ErrorKind::Revoked));

    assert!(
        sessions
            .authorize(&laptop.access_token, "harvest:read")
            .await
            .unwrap()
            .is_allowed()
    );
}

#[tokio::test]
async fn test_logout_all_devices_revokes_every_refresh_token() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let first = app.login("mandor1").await.tokens.unwrap();
    let second = app.login("mandor1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    assert_eq!(sessions.logout_all_devices(user).await.unwrap(), 2);

    for tokens in [&first, &second] {
        let result = sessions.refresh(&tokens.refresh_token).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.state, SessionState::RevokedOrExpired);
        assert_eq!(result.failure_reason, Some(ErrorKind::Revoked));
    }
    app.wait_for_event(SecurityEventType::LogoutAll).await;
}

#[tokio::test]
async fn test_change_password_ends_sessions() {
    let app = TestApp::new().await;
    let user = app.create_user("krani1", app.mandor).await;
    let before = app.login("krani1").await.tokens.unwrap();
    let sessions = app.engine.sessions();
    let new_password = "Kebun-Sawit-Lestari-77!";

    let weak = sessions
        .change_password(user, PASSWORD, "password")
        .await
        .unwrap_err();
    assert_eq!(weak.kind, ErrorKind::Validation);

    let revoked = sessions
        .change_password(user, PASSWORD, new_password)
        .await
        .unwrap();
    assert_eq!(revoked, 1);

    let result = sessions.refresh(&before.refresh_token).await.unwrap();
    assert_eq!(result.failure_reason, Some(ErrorKind::Revoked));

    let old = sessions
        .login(LoginRequest::new("krani1", PASSWORD))
        .await
        .unwrap();
    assert_eq!(old.failure_reason, Some(ErrorKind::InvalidCredentials));
    let new = sessions
        .login(LoginRequest::new("krani1", new_password))
        .await
        .unwrap();
    assert!(new.success);
}

#[tokio::test]
async fn test_resume_with_valid_and_invalid_access() {
    let app = TestApp::new().await;
    let user = app.create_user("manager1", app.manager).await;
    let tokens = app.login("manager1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    let ok = sessions.resume(&tokens.access_token, None).await.unwrap();
    assert!(ok.success);
    assert_eq!(ok.state, SessionState::Authenticated);
    assert_eq!(ok.user_id, Some(user));

    let bad = sessions.resume("garbage", None).await.unwrap();
    assert!(!bad.success);
    assert_eq!(bad.state, SessionState::RevokedOrExpired);
    assert_eq!(bad.failure_reason, Some(ErrorKind::Malformed));
}

struct FailingSink;

#[async_trait]
impl SecuritySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn record(&self, _event: &SecurityEvent) -> AppResult<()> {
        Err(AppError::internal("audit table unreachable"))
    }
}

#[tokio::test]
async fn test_failing_sink_does_not_affect_decisions() {
    let app = TestApp::with_sinks(helpers::test_config(), vec![Arc::new(FailingSink)]).await;
    app.create_user("manager1", app.manager).await;

    let tokens = app.login("manager1").await.tokens.unwrap();
    assert!(
        app.engine
            .sessions()
            .authorize(&tokens.access_token, "harvest:approve")
            .await
            .unwrap()
            .is_allowed()
    );
    app.wait_for_event(SecurityEventType::LoginSuccess).await;
}

#[tokio::test]
async fn test_disabled_security_log_still_decides() {
    let mut config = helpers::test_config();
    config.security.enabled = false;
    let app = TestApp::with_config(config).await;
    app.create_user("manager1", app.manager).await;

    app.login("manager1").await;
    assert!(app.sink.events().await.is_empty());
}
