//! Token service backed by the lineage revocation-marker store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fieldauth_core::config::TokenConfig;
use fieldauth_core::error::{AppError, ErrorKind};
use fieldauth_core::events::{Outcome, SecurityEvent, SecurityEventType};
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::{LineageId, UserId};
use fieldauth_entity::identity::Identity;
use fieldauth_entity::lineage::LineageRecord;
use fieldauth_store::{IdentityStore, LineageStore};

use crate::audit::SecurityLogger;
use crate::device::DeviceBindingValidator;
use crate::jwt::{Claims, JwtDecoder, JwtEncoder, TokenKind, TokenSubject};

/// Tokens handed to a client after login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// The user the tokens were minted for.
    pub user_id: UserId,
    /// Lineage shared by every token descending from the login.
    pub lineage_id: LineageId,
    /// Short-lived access token.
    pub access_token: String,
    /// Single-use refresh token.
    pub refresh_token: String,
    /// Offline token, minted only for device-bound logins.
    pub offline_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
    /// Offline token expiration timestamp.
    pub offline_expires_at: Option<DateTime<Utc>>,
}

/// Issues, validates, rotates, and revokes tokens.
///
/// Tokens themselves are not stored. Each login creates a lineage record
/// holding the `jti` of the only refresh token that may be rotated next;
/// every validation consults that record.
#[derive(Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    lineages: Arc<dyn LineageStore>,
    identities: Arc<dyn IdentityStore>,
    devices: DeviceBindingValidator,
    logger: SecurityLogger,
    offline_enabled: bool,
    offline_grace: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("encoder", &self.encoder)
            .field("offline_enabled", &self.offline_enabled)
            .field("offline_grace", &self.offline_grace)
            .finish()
    }
}

impl TokenService {
    /// Creates a token service.
    pub fn new(
        config: &TokenConfig,
        lineages: Arc<dyn LineageStore>,
        identities: Arc<dyn IdentityStore>,
        devices: DeviceBindingValidator,
        logger: SecurityLogger,
    ) -> Self {
        Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            lineages,
            identities,
            devices,
            logger,
            offline_enabled: config.offline_enabled,
            offline_grace: Duration::hours(config.offline_grace_hours as i64),
        }
    }

    /// Issues a fresh token set in a new lineage.
    ///
    /// An offline token is added when `device_id` is present and offline
    /// tokens are enabled.
    pub async fn issue(&self, identity: &Identity, device_id: Option<&str>) -> AppResult<TokenSet> {
        let now = Utc::now();
        let lineage_id = LineageId::new();
        let subject = TokenSubject::new(identity, device_id.map(str::to_string));

        let (access_token, access) = self.encoder.mint(TokenKind::Access, &subject, lineage_id, now)?;
        let (refresh_token, refresh) =
            self.encoder
                .mint(TokenKind::Refresh, &subject, lineage_id, now)?;
        let offline = match device_id {
            Some(_) if self.offline_enabled => Some(self.encoder.mint(
                TokenKind::Offline,
                &subject,
                lineage_id,
                now,
            )?),
            _ => None,
        };

        let lineage_expiry = match &offline {
            Some((_, claims)) => claims.expires_at().max(refresh.expires_at()),
            None => refresh.expires_at(),
        };

        self.lineages
            .insert_lineage(LineageRecord::new(
                lineage_id,
                identity.id,
                subject.device_id.clone(),
                refresh.jti.to_string(),
                lineage_expiry,
            ))
            .await?;

        info!(user_id = %identity.id, lineage_id = %lineage_id, "Issued token set");

        let (offline_token, offline_expires_at) = match offline {
            Some((token, claims)) => (Some(token), Some(claims.expires_at())),
            None => (None, None),
        };

        Ok(TokenSet {
            user_id: identity.id,
            lineage_id,
            access_token,
            refresh_token,
            offline_token,
            expires_in: access.exp - access.iat,
            access_expires_at: access.expires_at(),
            refresh_expires_at: refresh.expires_at(),
            offline_expires_at,
        })
    }

    /// Validates `token` as a token of kind `expected`.
    ///
    /// Verifies signature, kind, issuer and expiry, then consults the
    /// lineage record: a missing or revoked lineage yields `Revoked`, as
    /// does a refresh token that is no longer the lineage's current one.
    pub async fn validate(&self, token: &str, expected: TokenKind) -> AppResult<Claims> {
        let claims = self.decoder.decode(token, expected)?;

        let record = match self.lineages.find_lineage(claims.lid).await {
            Ok(record) => record,
            Err(e) if e.is(ErrorKind::StoreUnavailable) && self.within_offline_grace(&claims) => {
                warn!(
                    user_id = %claims.sub,
                    lineage_id = %claims.lid,
                    "Revocation store unreachable; accepting offline token within grace window"
                );
                return Ok(claims);
            }
            Err(e) => return Err(e),
        };

        let record = record.ok_or_else(|| AppError::revoked("Token lineage is unknown"))?;
        if record.revoked {
            return Err(AppError::revoked("Token lineage has been revoked"));
        }
        if expected == TokenKind::Refresh && record.current_refresh_jti != claims.jti.to_string() {
            self.report_replay(&claims);
            return Err(AppError::revoked("Refresh token has already been used"));
        }

        Ok(claims)
    }

    fn within_offline_grace(&self, claims: &Claims) -> bool {
        claims.kind == TokenKind::Offline && Utc::now() - claims.issued_at() <= self.offline_grace
    }

    fn report_replay(&self, claims: &Claims) {
        self.logger.record(
            SecurityEvent::new(SecurityEventType::RefreshReplay, Outcome::Failure)
                .with_user(claims.sub)
                .with_device(claims.did.as_deref())
                .with_details(format!("lineage {}", claims.lid)),
        );
    }

    /// Exchanges a refresh token for a new access token and a rotated
    /// refresh token in the same lineage.
    ///
    /// The presented refresh token is consumed by a compare-and-swap on
    /// the lineage's current `jti`, so of several concurrent calls with the
    /// same token exactly one succeeds and the rest fail with `Revoked`.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenSet> {
        let claims = self.validate(refresh_token, TokenKind::Refresh).await?;

        if let Some(device_id) = &claims.did {
            self.devices.ensure_not_revoked(claims.sub, device_id).await?;
        }

        let identity = match self.identities.find_by_id(claims.sub).await? {
            Some(identity) if identity.is_active => identity,
            _ => {
                self.lineages.revoke_lineage(claims.lid, Utc::now()).await?;
                return Err(AppError::revoked("Identity is no longer active"));
            }
        };

        let now = Utc::now();
        let subject = TokenSubject::new(&identity, claims.did.clone());
        let (access_token, access) = self.encoder.mint(TokenKind::Access, &subject, claims.lid, now)?;
        let (refresh_token, refresh) =
            self.encoder
                .mint(TokenKind::Refresh, &subject, claims.lid, now)?;

        let rotated = self
            .lineages
            .rotate_lineage(
                claims.lid,
                &claims.jti.to_string(),
                &refresh.jti.to_string(),
                refresh.expires_at(),
            )
            .await?;
        if !rotated {
            self.report_replay(&claims);
            return Err(AppError::revoked("Refresh token has already been used"));
        }

        debug!(user_id = %identity.id, lineage_id = %claims.lid, "Rotated refresh token");

        Ok(TokenSet {
            user_id: identity.id,
            lineage_id: claims.lid,
            access_token,
            refresh_token,
            offline_token: None,
            expires_in: access.exp - access.iat,
            access_expires_at: access.expires_at(),
            refresh_expires_at: refresh.expires_at(),
            offline_expires_at: None,
        })
    }

    /// Revokes one lineage. Returns `false` if it was unknown.
    pub async fn revoke_lineage(&self, lineage_id: LineageId) -> AppResult<bool> {
        let revoked = self.lineages.revoke_lineage(lineage_id, Utc::now()).await?;
        if revoked {
            info!(lineage_id = %lineage_id, "Lineage revoked");
        }
        Ok(revoked)
    }

    /// Revokes every lineage of a user. Returns how many were live.
    pub async fn revoke_user(&self, user_id: UserId) -> AppResult<u64> {
        let count = self
            .lineages
            .revoke_user_lineages(user_id, Utc::now())
            .await?;
        info!(user_id = %user_id, count, "Revoked all lineages for user");
        Ok(count)
    }

    /// Deletes lineage records whose tokens have all naturally expired.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.lineages.purge_expired_lineages(Utc::now()).await
    }
}
