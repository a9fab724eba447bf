//! Role-permission mappings and per-user overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::types::id::{PermissionId, RoleId, UserId};

/// One edge of the role to permission baseline mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    /// The role.
    pub role_id: RoleId,
    /// The permission it grants.
    pub permission_id: PermissionId,
}

/// A per-user grant or deny that overrides the role baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    /// The affected user.
    pub user_id: UserId,
    /// The permission being granted or denied.
    pub permission_id: PermissionId,
    /// `true` grants, `false` denies.
    pub is_granted: bool,
    /// Optional expiry; an expired override behaves as if absent.
    pub expires_at: Option<DateTime<Utc>>,
    /// Administrator who created the override.
    pub created_by: Option<UserId>,
    /// When the override was created.
    pub created_at: DateTime<Utc>,
}

impl UserPermissionOverride {
    /// Create a grant override.
    pub fn grant(
        user_id: UserId,
        permission_id: PermissionId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            permission_id,
            is_granted: true,
            expires_at,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    /// Create a deny override.
    pub fn deny(
        user_id: UserId,
        permission_id: PermissionId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            is_granted: false,
            ..Self::grant(user_id, permission_id, expires_at)
        }
    }

    /// Expired means the expiry lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Active overrides have no expiry or an expiry not yet passed.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now)
    }
}
