//! Session orchestrator: login, refresh, authorize, logout.
//!
//! Authentication and authorization failures are ordinary outcomes and
//! come back inside `Ok` ([`SessionResult`] with `success == false`, or
//! [`AuthorizationDecision::Denied`]). Infrastructure failures such as
//! `StoreUnavailable` come back as `Err` and are never reported as a
//! credential or permission failure.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fieldauth_core::error::{AppError, ErrorKind};
use fieldauth_core::events::{Outcome, SecurityEvent, SecurityEventType, Severity};
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::device::{DeviceBinding, DeviceContext};
use fieldauth_entity::rbac::{PermissionKey, RbacStatistics};
use fieldauth_store::IdentityStore;

use crate::audit::SecurityLogger;
use crate::credential::CredentialVerifier;
use crate::device::{DeviceBindingValidator, DeviceVerification};
use crate::jwt::{Claims, TokenKind};
use crate::ratelimit::RateLimiter;
use crate::rbac::{EffectivePermissions, PermissionResolver};
use crate::token::{TokenService, TokenSet};

use super::state::{SessionEvent, SessionState};

const PASSWORD_CHANGE: &str = "password_change";

/// A login attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    /// The presented secret.
    pub secret: String,
    /// Client network address, used for rate limiting and audit.
    pub source_addr: Option<String>,
    /// Device context; required for device binding on mobile platforms.
    pub device: Option<DeviceContext>,
}

impl LoginRequest {
    /// A login without source address or device.
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            source_addr: None,
            device: None,
        }
    }

    /// Attach the client network address.
    pub fn with_source(mut self, source_addr: impl Into<String>) -> Self {
        self.source_addr = Some(source_addr.into());
        self
    }

    /// Attach a device context.
    pub fn with_device(mut self, device: DeviceContext) -> Self {
        self.device = Some(device);
        self
    }
}

/// Outcome of a login, refresh, resume, or logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Session state after the operation.
    pub state: SessionState,
    /// The user, when known.
    pub user_id: Option<UserId>,
    /// Newly issued tokens.
    pub tokens: Option<TokenSet>,
    /// The user's effective permissions, after login or refresh.
    pub effective_permissions: Option<EffectivePermissions>,
    /// Why the operation failed.
    pub failure_reason: Option<ErrorKind>,
}

impl SessionResult {
    fn succeeded(state: SessionState, user_id: UserId) -> Self {
        Self {
            success: true,
            state,
            user_id: Some(user_id),
            tokens: None,
            effective_permissions: None,
            failure_reason: None,
        }
    }

    fn failed(state: SessionState, reason: ErrorKind, user_id: Option<UserId>) -> Self {
        Self {
            success: false,
            state,
            user_id,
            tokens: None,
            effective_permissions: None,
            failure_reason: Some(reason),
        }
    }

    fn with_tokens(mut self, tokens: TokenSet, permissions: EffectivePermissions) -> Self {
        self.tokens = Some(tokens);
        self.effective_permissions = Some(permissions);
        self
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AuthorizationDecision {
    /// The token is valid and carries the permission.
    Allowed {
        /// The authorized user.
        user_id: UserId,
    },
    /// Access refused. `PermissionDenied` never names the missing permission.
    Denied {
        /// Why access was refused.
        reason: ErrorKind,
    },
}

impl AuthorizationDecision {
    /// Whether access was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Splits an error into an auth outcome or an infrastructure failure.
fn classify(err: AppError) -> AppResult<ErrorKind> {
    if err.kind.is_auth_failure() {
        Ok(err.kind)
    } else {
        Err(err)
    }
}

/// The state reached from `start` through `events`. The sequences passed
/// in are fixed per flow and always legal.
fn settle(start: SessionState, events: &[SessionEvent]) -> SessionState {
    start.replay(events).unwrap_or(SessionState::RevokedOrExpired)
}

/// Drives every authentication and authorization flow.
#[derive(Clone)]
pub struct SessionOrchestrator {
    verifier: CredentialVerifier,
    devices: DeviceBindingValidator,
    tokens: TokenService,
    permissions: PermissionResolver,
    limiter: RateLimiter,
    logger: SecurityLogger,
    identities: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("tokens", &self.tokens)
            .field("permissions", &self.permissions)
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl SessionOrchestrator {
    /// Creates an orchestrator from its components.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        verifier: CredentialVerifier,
        devices: DeviceBindingValidator,
        tokens: TokenService,
        permissions: PermissionResolver,
        limiter: RateLimiter,
        logger: SecurityLogger,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            verifier,
            devices,
            tokens,
            permissions,
            limiter,
            logger,
            identities,
        }
    }

    /// The token service.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// The permission resolver.
    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    /// The rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The security logger.
    pub fn logger(&self) -> &SecurityLogger {
        &self.logger
    }

    /// Authenticates a user and issues a token set.
    ///
    /// Order: rate limit, credentials, device binding (mobile only), token
    /// issuance, permission resolution. A rate-limited attempt never
    /// reaches the credential check.
    pub async fn login(&self, request: LoginRequest) -> AppResult<SessionResult> {
        let source = request.source_addr.as_deref();
        let device_id = request.device.as_ref().map(|d| d.device_id.as_str());
        let failed = |kind| {
            SessionResult::failed(
                settle(
                    SessionState::Anonymous,
                    &[SessionEvent::LoginRequested, SessionEvent::LoginFailed],
                ),
                kind,
                None,
            )
        };
        let event = |event_type, outcome| {
            SecurityEvent::new(event_type, outcome)
                .with_identifier(request.identifier.clone())
                .with_source(source)
                .with_device(device_id)
        };

        if let Err(e) = self.limiter.check_login(&request.identifier, source) {
            self.logger.record(
                event(SecurityEventType::RateLimitExceeded, Outcome::Failure)
                    .with_details(e.message.clone()),
            );
            return Ok(failed(classify(e)?));
        }

        let identity = match self.verifier.verify(&request.identifier, &request.secret).await {
            Ok(identity) => identity,
            Err(e) => {
                self.logger.record(
                    event(SecurityEventType::LoginFailure, Outcome::Failure)
                        .with_details(e.kind.as_str()),
                );
                return Ok(failed(classify(e)?));
            }
        };

        let mut bound_device = None;
        if let Some(device) = request.device.as_ref().filter(|d| d.platform.is_mobile()) {
            match self.devices.validate(identity.id, device).await {
                Ok(verification) => {
                    if verification == DeviceVerification::Registered {
                        self.logger.record(
                            event(SecurityEventType::DeviceBound, Outcome::Success)
                                .with_user(identity.id)
                                .with_details(device.platform.to_string()),
                        );
                    }
                    bound_device = Some(device.device_id.as_str());
                }
                Err(e) => {
                    let event_type = match e.kind {
                        ErrorKind::DeviceMismatch => SecurityEventType::DeviceMismatch,
                        ErrorKind::DeviceRevoked => SecurityEventType::DeviceRevoked,
                        ErrorKind::DeviceLimitExceeded => SecurityEventType::DeviceLimitExceeded,
                        _ => SecurityEventType::LoginFailure,
                    };
                    self.logger.record(
                        event(event_type, Outcome::Failure)
                            .with_user(identity.id)
                            .with_details(e.kind.as_str()),
                    );
                    let kind = classify(e)?;
                    return Ok(SessionResult {
                        user_id: Some(identity.id),
                        ..failed(kind)
                    });
                }
            }
        }

        let tokens = self.tokens.issue(&identity, bound_device).await?;
        let permissions = self.permissions.effective_permissions(identity.id).await?;
        self.limiter.reset_login(&request.identifier, source);

        if let Err(e) = self.identities.record_login(identity.id, Utc::now()).await {
            warn!(user_id = %identity.id, error = %e, "Failed to record last login");
        }

        self.logger.record(
            event(SecurityEventType::LoginSuccess, Outcome::Success).with_user(identity.id),
        );
        info!(
            user_id = %identity.id,
            device_id = ?bound_device,
            permissions = permissions.len(),
            "Login succeeded"
        );

        let state = settle(
            SessionState::Anonymous,
            &[SessionEvent::LoginRequested, SessionEvent::LoginSucceeded],
        );
        Ok(SessionResult::succeeded(state, identity.id).with_tokens(tokens, permissions))
    }

    /// Exchanges a refresh token for a rotated token set.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<SessionResult> {
        let start = settle(SessionState::Authenticated, &[SessionEvent::AccessExpired]);

        let tokens = match self.tokens.refresh(refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.logger.record(
                    SecurityEvent::new(SecurityEventType::TokenRefresh, Outcome::Failure)
                        .with_details(e.kind.as_str()),
                );
                let kind = classify(e)?;
                let state = settle(start, &[SessionEvent::RefreshFailed]);
                return Ok(SessionResult::failed(state, kind, None));
            }
        };

        let permissions = self.permissions.effective_permissions(tokens.user_id).await?;
        self.logger.record(
            SecurityEvent::new(SecurityEventType::TokenRefresh, Outcome::Success)
                .with_user(tokens.user_id),
        );

        let state = settle(start, &[SessionEvent::RefreshSucceeded]);
        Ok(SessionResult::succeeded(state, tokens.user_id).with_tokens(tokens, permissions))
    }

    /// Validates an access token and, for device-bound tokens, that the
    /// device is still trusted.
    async fn authenticate_access(&self, access_token: &str) -> AppResult<Claims> {
        let claims = self.tokens.validate(access_token, TokenKind::Access).await?;
        if let Some(device_id) = &claims.did {
            self.devices.ensure_not_revoked(claims.sub, device_id).await?;
        }
        Ok(claims)
    }

    fn deny(
        &self,
        reason: ErrorKind,
        claims: Option<&Claims>,
        permission: &str,
    ) -> AuthorizationDecision {
        let mut event =
            SecurityEvent::new(SecurityEventType::AuthorizationDenied, Outcome::Failure)
                .with_details(format!("{permission}: {reason}"));
        if let Some(claims) = claims {
            event = event.with_user(claims.sub).with_device(claims.did.as_deref());
        }
        self.logger.record(event);
        AuthorizationDecision::Denied { reason }
    }

    /// Decides whether the bearer of `access_token` holds `required`
    /// (`resource:action`).
    pub async fn authorize(
        &self,
        access_token: &str,
        required: &str,
    ) -> AppResult<AuthorizationDecision> {
        let key: PermissionKey = required.parse()?;

        let claims = match self.authenticate_access(access_token).await {
            Ok(claims) => claims,
            Err(e) => return Ok(self.deny(classify(e)?, None, required)),
        };

        if !self.permissions.check(claims.sub, &key).await? {
            return Ok(self.deny(ErrorKind::PermissionDenied, Some(&claims), required));
        }

        debug!(
            user_id = %claims.sub,
            device_id = ?claims.did,
            permission = %key,
            "Authorization allowed"
        );
        Ok(AuthorizationDecision::Allowed { user_id: claims.sub })
    }

    /// Per-request session check.
    ///
    /// A valid access token keeps the session authenticated. An expired
    /// one is exchanged through `refresh_token` when given. Anything else
    /// ends the session.
    pub async fn resume(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> AppResult<SessionResult> {
        match self.authenticate_access(access_token).await {
            Ok(claims) => {
                let state = settle(SessionState::Authenticated, &[SessionEvent::AccessValid]);
                Ok(SessionResult::succeeded(state, claims.sub))
            }
            Err(e) if e.is(ErrorKind::Expired) => match refresh_token {
                Some(refresh_token) => self.refresh(refresh_token).await,
                None => {
                    let state = settle(
                        SessionState::Authenticated,
                        &[SessionEvent::AccessExpired, SessionEvent::RefreshFailed],
                    );
                    Ok(SessionResult::failed(state, ErrorKind::Expired, None))
                }
            },
            Err(e) => {
                let kind = classify(e)?;
                let state = settle(SessionState::Authenticated, &[SessionEvent::AccessRevoked]);
                Ok(SessionResult::failed(state, kind, None))
            }
        }
    }

    /// Ends the lineage the access token belongs to.
    pub async fn logout(&self, access_token: &str) -> AppResult<SessionResult> {
        let claims = match self.tokens.validate(access_token, TokenKind::Access).await {
            Ok(claims) => claims,
            Err(e) => {
                let kind = classify(e)?;
                let state = settle(SessionState::Authenticated, &[SessionEvent::AccessRevoked]);
                return Ok(SessionResult::failed(state, kind, None));
            }
        };

        self.tokens.revoke_lineage(claims.lid).await?;
        self.logger.record(
            SecurityEvent::new(SecurityEventType::Logout, Outcome::Success)
                .with_user(claims.sub)
                .with_device(claims.did.as_deref()),
        );

        let state = settle(SessionState::Authenticated, &[SessionEvent::LoggedOut]);
        Ok(SessionResult::succeeded(state, claims.sub))
    }

    /// Ends every lineage of `user_id`. Returns how many were live.
    pub async fn logout_all_devices(&self, user_id: UserId) -> AppResult<u64> {
        let count = self.tokens.revoke_user(user_id).await?;
        self.logger.record(
            SecurityEvent::new(SecurityEventType::LogoutAll, Outcome::Success)
                .with_user(user_id)
                .with_details(format!("{count} lineages revoked")),
        );
        Ok(count)
    }

    /// Changes a user's password and ends all their sessions.
    ///
    /// Returns the number of lineages revoked.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> AppResult<u64> {
        if let Err(e) = self.limiter.check_operation(user_id, PASSWORD_CHANGE) {
            self.logger.record(
                SecurityEvent::new(SecurityEventType::RateLimitExceeded, Outcome::Failure)
                    .with_user(user_id)
                    .with_details(PASSWORD_CHANGE),
            );
            return Err(e);
        }

        if let Err(e) = self.verifier.change_secret(user_id, current, new).await {
            self.logger.record(
                SecurityEvent::new(SecurityEventType::PasswordChange, Outcome::Failure)
                    .with_user(user_id)
                    .with_details(e.kind.as_str()),
            );
            return Err(e);
        }

        let revoked = self.tokens.revoke_user(user_id).await?;
        self.logger.record(
            SecurityEvent::new(SecurityEventType::PasswordChange, Outcome::Success)
                .with_user(user_id)
                .with_details(format!("{revoked} lineages revoked")),
        );
        Ok(revoked)
    }

    /// Revokes a device binding. Tokens bound to it stop working on their
    /// next use.
    pub async fn revoke_device(&self, user_id: UserId, device_id: &str) -> AppResult<()> {
        self.devices.revoke(user_id, device_id).await?;
        self.logger.record(
            SecurityEvent::new(SecurityEventType::DeviceRevoked, Outcome::Success)
                .with_user(user_id)
                .with_device(Some(device_id))
                .with_severity(Severity::Info),
        );
        Ok(())
    }

    /// A user's device bindings.
    pub async fn list_devices(&self, user_id: UserId) -> AppResult<Vec<DeviceBinding>> {
        self.devices.list(user_id).await
    }

    /// RBAC statistics.
    pub async fn statistics(&self) -> AppResult<RbacStatistics> {
        self.permissions.statistics().await
    }
}
