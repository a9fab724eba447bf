//! RBAC statistics projection.

use serde::{Deserialize, Serialize};

/// Read-only counts derived from the RBAC tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacStatistics {
    /// All roles.
    pub total_roles: u64,
    /// Roles with the active flag set.
    pub active_roles: u64,
    /// Seeded system roles.
    pub system_roles: u64,
    /// Tenant-defined roles (`total_roles - system_roles`).
    pub custom_roles: u64,
    /// All permissions.
    pub total_permissions: u64,
    /// Permissions with the active flag set.
    pub active_permissions: u64,
    /// Role to permission mappings.
    pub total_role_permissions: u64,
    /// All user overrides, expired or not.
    pub total_user_overrides: u64,
    /// Overrides with no expiry or an expiry in the future.
    pub active_user_overrides: u64,
    /// Overrides whose expiry has passed.
    pub expired_user_overrides: u64,
}
