//! JWT claims carried by every token kind.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldauth_core::types::id::{CompanyId, LineageId, RoleId, UserId};
use fieldauth_entity::identity::Identity;

/// Distinguishes the three token kinds. Each kind is signed with its own key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token presented on every request.
    Access,
    /// Long-lived, single-use token exchanged for a new access token.
    Refresh,
    /// Long-lived mobile token usable while the revocation store is unreachable.
    Offline,
}

impl TokenKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Issuer.
    pub iss: String,
    /// Subject, the user ID.
    pub sub: UserId,
    /// Lineage the token descends from.
    pub lid: LineageId,
    /// Token kind.
    pub kind: TokenKind,
    /// Bound device, for mobile logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    /// Role at issuance.
    pub role: RoleId,
    /// Company at issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<CompanyId>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// Returns the issue time as a `DateTime<Utc>`.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Returns the remaining TTL in seconds (0 if expired).
    pub fn remaining_ttl_seconds(&self) -> u64 {
        let remaining = self.exp - Utc::now().timestamp();
        if remaining > 0 { remaining as u64 } else { 0 }
    }
}

/// Who a token is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    /// The user.
    pub user_id: UserId,
    /// Role at issuance.
    pub role_id: RoleId,
    /// Company at issuance.
    pub company_id: Option<CompanyId>,
    /// Bound device, if any.
    pub device_id: Option<String>,
}

impl TokenSubject {
    /// Subject for an identity, optionally bound to a device.
    pub fn new(identity: &Identity, device_id: Option<String>) -> Self {
        Self {
            user_id: identity.id,
            role_id: identity.role_id,
            company_id: identity.company_id,
            device_id,
        }
    }
}
