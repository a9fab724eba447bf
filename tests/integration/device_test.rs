//! Device trust-on-first-use and revocation.

use fieldauth_auth::{AuthorizationDecision, LoginRequest};
use fieldauth_core::error::ErrorKind;
use fieldauth_core::events::SecurityEventType;
use fieldauth_entity::device::{DeviceContext, Platform};

use crate::helpers::{self, PASSWORD, TestApp};

fn phone(fingerprint: &str) -> DeviceContext {
    DeviceContext::new("A1", fingerprint, Platform::Android)
}

fn mobile_login(fingerprint: &str) -> LoginRequest {
    LoginRequest::new("mandor1", PASSWORD)
        .with_source("10.2.0.9")
        .with_device(phone(fingerprint))
}

#[tokio::test]
async fn test_first_login_binds_device() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();

    let first = sessions.login(mobile_login("fp-1")).await.unwrap();
    assert!(first.success);
    let tokens = first.tokens.unwrap();
    assert!(tokens.offline_token.is_some());
    assert!(tokens.offline_expires_at > Some(tokens.refresh_expires_at));

    let event = app.wait_for_event(SecurityEventType::DeviceBound).await;
    assert_eq!(event.device_id.as_deref(), Some("A1"));

    let again = sessions.login(mobile_login("fp-1")).await.unwrap();
    assert!(again.success);

    let devices = sessions.list_devices(user).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].platform, Platform::Android);
    assert!(!devices[0].revoked);
}

#[tokio::test]
async fn test_fingerprint_mismatch_rejected() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();

    sessions.login(mobile_login("fp-1")).await.unwrap();
    let result = sessions.login(mobile_login("fp-cloned")).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.failure_reason, Some(ErrorKind::DeviceMismatch));
    assert_eq!(result.user_id, Some(user));
    assert!(result.tokens.is_none());
    app.wait_for_event(SecurityEventType::DeviceMismatch).await;
}

#[tokio::test]
async fn test_web_login_skips_device_binding() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;

    let result = app
        .engine
        .sessions()
        .login(
            LoginRequest::new("mandor1", PASSWORD)
                .with_device(DeviceContext::new("browser", "ua-hash", Platform::Web)),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.tokens.unwrap().offline_token.is_none());
    assert!(app.engine.sessions().list_devices(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_device_revoked_mid_session() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();
    let tokens = sessions
        .login(mobile_login("fp-1"))
        .await
        .unwrap()
        .tokens
        .unwrap();

    sessions.revoke_device(user, "A1").await.unwrap();

    assert_eq!(
        sessions
            .authorize(&tokens.access_token, "harvest:read")
            .await
            .unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::DeviceRevoked
        }
    );
    let refreshed = sessions.refresh(&tokens.refresh_token).await.unwrap();
    assert_eq!(refreshed.failure_reason, Some(ErrorKind::DeviceRevoked));

    let relogin = sessions.login(mobile_login("fp-1")).await.unwrap();
    assert_eq!(relogin.failure_reason, Some(ErrorKind::DeviceRevoked));

    let err = sessions.revoke_device(user, "unknown").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_device_limit_refuses_extra_phone() {
    let mut config = helpers::test_config();
    config.devices.max_devices_per_user = 2;
    let app = TestApp::with_config(config).await;
    let user = app.create_user("mandor1", app.mandor).await;
    let sessions = app.engine.sessions();

    for device in ["A1", "A2"] {
        let request = LoginRequest::new("mandor1", PASSWORD)
            .with_device(DeviceContext::new(device, "fp", Platform::Android));
        assert!(sessions.login(request).await.unwrap().success);
    }

    let third = LoginRequest::new("mandor1", PASSWORD)
        .with_device(DeviceContext::new("A3", "fp", Platform::Android));
    let result = sessions.login(third).await.unwrap();
    assert!(!result.success);
    assert!(result.tokens.is_none());
    assert_eq!(result.failure_reason, Some(ErrorKind::DeviceLimitExceeded));

    let event = app
        .wait_for_event(SecurityEventType::DeviceLimitExceeded)
        .await;
    assert_eq!(event.user_id, Some(user));
    assert_eq!(sessions.list_devices(user).await.unwrap().len(), 2);

    sessions.revoke_device(user, "A1").await.unwrap();
    let retry = LoginRequest::new("mandor1", PASSWORD)
        .with_device(DeviceContext::new("A3", "fp", Platform::Android));
    assert!(sessions.login(retry).await.unwrap().success);
}
