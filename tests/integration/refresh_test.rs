//! Refresh rotation, replay detection, and per-request resume.

use chrono::{Duration, Utc};

use fieldauth_auth::jwt::{JwtEncoder, TokenKind, TokenSubject};
use fieldauth_auth::SessionState;
use fieldauth_core::error::ErrorKind;
use fieldauth_core::events::{SecurityEventType, Severity};
use fieldauth_store::IdentityStore;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_refresh_rotates_within_lineage() {
    let app = TestApp::new().await;
    app.create_user("asisten1", app.mandor).await;
    let first = app.login("asisten1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    let result = sessions.refresh(&first.refresh_token).await.unwrap();
    assert!(result.success);
    assert_eq!(result.state, SessionState::Authenticated);
    let second = result.tokens.unwrap();
    assert_eq!(second.lineage_id, first.lineage_id);
    assert_ne!(second.refresh_token, first.refresh_token);
    assert!(result.effective_permissions.is_some());

    assert!(
        sessions
            .authorize(&second.access_token, "harvest:read")
            .await
            .unwrap()
            .is_allowed()
    );
    app.wait_for_event(SecurityEventType::TokenRefresh).await;
}

#[tokio::test]
async fn test_concurrent_refresh_single_winner() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let tokens = app.login("mandor1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    let (a, b) = tokio::join!(
        sessions.refresh(&tokens.refresh_token),
        sessions.refresh(&tokens.refresh_token)
    );
    let results = [a.unwrap(), b.unwrap()];

    let winners: Vec<_> = results.iter().filter(|r| r.success).collect();
    let losers: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].state, SessionState::Authenticated);
    assert_eq!(losers.len(), 1);
    assert_eq!(losers[0].state, SessionState::RevokedOrExpired);
    assert_eq!(losers[0].failure_reason, Some(ErrorKind::Revoked));
}

#[tokio::test]
async fn test_replayed_refresh_token_is_reported() {
    let app = TestApp::new().await;
    let user = app.create_user("mandor1", app.mandor).await;
    let tokens = app.login("mandor1").await.tokens.unwrap();
    let sessions = app.engine.sessions();

    assert!(sessions.refresh(&tokens.refresh_token).await.unwrap().success);
    let replay = sessions.refresh(&tokens.refresh_token).await.unwrap();
    assert_eq!(replay.failure_reason, Some(ErrorKind::Revoked));

    let event = app.wait_for_event(SecurityEventType::RefreshReplay).await;
    assert_eq!(event.user_id, Some(user));
    assert_eq!(event.severity, Severity::Critical);
}

#[tokio::test]
async fn test_resume_refreshes_expired_access() {
    let app = TestApp::new().await;
    let user = app.create_user("manager1", app.manager).await;
    let tokens = app.login("manager1").await.tokens.unwrap();
    let identity = app.store.find_by_id(user).await.unwrap().unwrap();

    let encoder = JwtEncoder::new(&app.engine.config().tokens);
    let (expired_access, _) = encoder
        .mint(
            TokenKind::Access,
            &TokenSubject::new(&identity, None),
            tokens.lineage_id,
            Utc::now() - Duration::hours(1),
        )
        .unwrap();
    let sessions = app.engine.sessions();

    let without_refresh = sessions.resume(&expired_access, None).await.unwrap();
    assert_eq!(without_refresh.failure_reason, Some(ErrorKind::Expired));
    assert_eq!(without_refresh.state, SessionState::RevokedOrExpired);

    let resumed = sessions
        .resume(&expired_access, Some(&tokens.refresh_token))
        .await
        .unwrap();
    assert!(resumed.success);
    assert_eq!(resumed.state, SessionState::Authenticated);
    assert!(resumed.tokens.is_some());
}

#[tokio::test]
async fn test_deactivated_user_cannot_refresh() {
    let app = TestApp::new().await;
    let user = app.create_user("satpam1", app.mandor).await;
    let tokens = app.login("satpam1").await.tokens.unwrap();
    app.store.set_identity_active(user, false);

    let result = app
        .engine
        .sessions()
        .refresh(&tokens.refresh_token)
        .await
        .unwrap();
    assert_eq!(result.failure_reason, Some(ErrorKind::Revoked));
}

#[tokio::test]
async fn test_maintenance_keeps_live_lineages() {
    let app = TestApp::new().await;
    app.create_user("mandor1", app.mandor).await;
    let tokens = app.login("mandor1").await.tokens.unwrap();

    let report = app.engine.maintenance().run_once().await.unwrap();
    assert_eq!(report.lineages_purged, 0);

    assert!(
        app.engine
            .sessions()
            .refresh(&tokens.refresh_token)
            .await
            .unwrap()
            .success
    );
}
