//! JWT token creation with per-kind signing keys.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use fieldauth_core::config::TokenConfig;
use fieldauth_core::error::AppError;
use fieldauth_core::types::id::LineageId;

use super::claims::{Claims, TokenKind, TokenSubject};

/// Signs access, refresh, and offline tokens with HS256.
#[derive(Clone)]
pub struct JwtEncoder {
    issuer: String,
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    offline_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    offline_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("offline_ttl", &self.offline_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from token configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            access_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            offline_key: EncodingKey::from_secret(config.offline_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes as i64),
            refresh_ttl: Duration::hours(config.refresh_ttl_hours as i64),
            offline_ttl: Duration::hours(config.offline_ttl_hours as i64),
        }
    }

    /// Lifetime of tokens of `kind`.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Offline => self.offline_ttl,
        }
    }

    fn key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_key,
            TokenKind::Refresh => &self.refresh_key,
            TokenKind::Offline => &self.offline_key,
        }
    }

    /// Mints a token of `kind` in `lineage`, issued at `now`.
    ///
    /// Returns the compact token and its claims.
    pub fn mint(
        &self,
        kind: TokenKind,
        subject: &TokenSubject,
        lineage: LineageId,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), AppError> {
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.user_id,
            lid: lineage,
            kind,
            did: subject.device_id.clone(),
            role: subject.role_id,
            cid: subject.company_id,
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, self.key(kind))
            .map_err(|e| AppError::internal(format!("Failed to encode {kind} token: {e}")))?;

        Ok((token, claims))
    }
}
