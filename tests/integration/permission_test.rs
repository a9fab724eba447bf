//! Effective permissions through the session flows.

use std::time::Duration;

use chrono::Utc;

use fieldauth_auth::{AuthorizationDecision, CheckReason};
use fieldauth_core::error::ErrorKind;
use fieldauth_entity::rbac::PermissionKey;
use fieldauth_store::RbacStore;

use crate::helpers::TestApp;

fn key(raw: &str) -> PermissionKey {
    raw.parse().unwrap()
}

#[tokio::test]
async fn test_grant_override_takes_effect_immediately() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let access = app.login("mandor1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();

    assert!(!sessions.authorize(&access, "report:export").await.unwrap().is_allowed());

    sessions
        .permissions()
        .assign_override(user, &key("report:export"), true, None, None)
        .await
        .unwrap();
    assert!(sessions.authorize(&access, "report:export").await.unwrap().is_allowed());

    let check = sessions
        .permissions()
        .check_with_reason(user, &key("report:export"))
        .await
        .unwrap();
    assert_eq!(check.reason, CheckReason::GrantOverride);
}

#[tokio::test]
async fn test_deny_override_beats_role_baseline() {
    let app = TestApp::new().await;
    let manager = app.create_user("manager1", app.manager).await;
    let access = app.login("manager1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();

    sessions
        .permissions()
        .assign_override(manager, &key("harvest:approve"), false, None, None)
        .await
        .unwrap();

    assert_eq!(
        sessions.authorize(&access, "harvest:approve").await.unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::PermissionDenied
        }
    );
    assert!(sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_expiring_grant_stops_authorizing() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let access = app.login("mandor1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();

    let expires_at = Utc::now() + chrono::Duration::milliseconds(300);
    sessions
        .permissions()
        .assign_override(user, &key("harvest:approve"), true, Some(expires_at), None)
        .await
        .unwrap();
    assert!(sessions.authorize(&access, "harvest:approve").await.unwrap().is_allowed());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!sessions.authorize(&access, "harvest:approve").await.unwrap().is_allowed());

    let report = app.engine.maintenance().run_once().await.unwrap();
    assert_eq!(report.overrides_removed, 1);
}

#[tokio::test]
async fn test_deactivated_permission_drops_from_cached_baseline() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let access = app.login("mandor1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();
    assert!(sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());

    let read = app
        .store
        .find_permission_by_key(&key("harvest:read"))
        .await
        .unwrap()
        .unwrap();
    app.store.set_permission_active(read.id, false);

    assert!(!sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_deactivated_identity_loses_cached_permissions() {
    let app = TestApp::new().await;
    assert!(app.engine.config().rbac.cache_enabled);
    let user = app.create_user("mandor1", app.mandor).await;
    let access = app.login("mandor1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();
    assert!(sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());

    app.store.set_identity_active(user, false);

    assert_eq!(
        sessions.authorize(&access, "harvest:read").await.unwrap(),
        AuthorizationDecision::Denied {
            reason: ErrorKind::PermissionDenied
        }
    );
    assert!(
        sessions
            .permissions()
            .effective_permissions(user)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_deactivated_role_loses_cached_permissions() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let access = app.login("mandor1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();
    assert!(sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());

    app.store.set_role_active(app.mandor, false);

    assert!(!sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_removed_role_mapping_loses_cached_permission() {
    let app = TestApp::new().await;
    app.create_user("manager1", app.manager).await;
    let access = app.login("manager1").await.tokens.unwrap().access_token;
    let sessions = app.engine.sessions();
    assert!(sessions.authorize(&access, "harvest:approve").await.unwrap().is_allowed());

    let approve = app
        .store
        .find_permission_by_key(&key("harvest:approve"))
        .await
        .unwrap()
        .unwrap();
    assert!(app.store.revoke_role_permission(app.manager, approve.id));

    assert!(!sessions.authorize(&access, "harvest:approve").await.unwrap().is_allowed());
    assert!(sessions.authorize(&access, "harvest:read").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_statistics() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    app.engine
        .sessions()
        .permissions()
        .assign_override(user, &key("report:export"), true, None, None)
        .await
        .unwrap();

    let stats = app.engine.sessions().statistics().await.unwrap();
    assert_eq!(stats.total_roles, 2);
    assert_eq!(stats.system_roles, 2);
    assert_eq!(stats.custom_roles, 0);
    assert_eq!(stats.total_permissions, 3);
    assert_eq!(stats.active_permissions, 3);
    assert_eq!(stats.total_role_permissions, 3);
    assert_eq!(stats.total_user_overrides, 1);
    assert_eq!(stats.active_user_overrides, 1);
}
