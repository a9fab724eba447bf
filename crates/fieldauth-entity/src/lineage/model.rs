//! Lineage revocation marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::types::id::{LineageId, UserId};

/// Server-side state for one refresh-token lineage.
///
/// A lineage starts at login and is inherited by every rotation. The only
/// token material kept is the `jti` of the refresh token currently allowed
/// to rotate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageRecord {
    /// Lineage identifier.
    pub id: LineageId,
    /// Owner of the lineage.
    pub user_id: UserId,
    /// Device the lineage is bound to, for mobile logins.
    pub device_id: Option<String>,
    /// `jti` of the only refresh token that may be rotated next.
    pub current_refresh_jti: String,
    /// Whether the lineage has been revoked.
    pub revoked: bool,
    /// When the lineage was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// When the lineage was created (login time).
    pub created_at: DateTime<Utc>,
    /// When the lineage last rotated.
    pub rotated_at: Option<DateTime<Utc>>,
    /// Latest natural expiry of any token in the lineage.
    pub expires_at: DateTime<Utc>,
}

impl LineageRecord {
    /// Create a live lineage record.
    pub fn new(
        id: LineageId,
        user_id: UserId,
        device_id: Option<String>,
        current_refresh_jti: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            device_id,
            current_refresh_jti: current_refresh_jti.into(),
            revoked: false,
            revoked_at: None,
            created_at: Utc::now(),
            rotated_at: None,
            expires_at,
        }
    }

    /// Whether every token of this lineage is past its natural expiry.
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
