//! Read-only RBAC statistics.

use chrono::{DateTime, Utc};

use fieldauth_entity::rbac::{Permission, RbacStatistics, Role, UserPermissionOverride};

/// Project counts from the RBAC tables as of `now`.
pub fn compute(
    roles: &[Role],
    permissions: &[Permission],
    role_permission_count: u64,
    overrides: &[UserPermissionOverride],
    now: DateTime<Utc>,
) -> RbacStatistics {
    let total_roles = roles.len() as u64;
    let system_roles = roles.iter().filter(|r| r.is_system).count() as u64;
    let expired = overrides.iter().filter(|o| o.is_expired_at(now)).count() as u64;

    RbacStatistics {
        total_roles,
        active_roles: roles.iter().filter(|r| r.is_active).count() as u64,
        system_roles,
        custom_roles: total_roles - system_roles,
        total_permissions: permissions.len() as u64,
        active_permissions: permissions.iter().filter(|p| p.is_active).count() as u64,
        total_role_permissions: role_permission_count,
        total_user_overrides: overrides.len() as u64,
        active_user_overrides: overrides.len() as u64 - expired,
        expired_user_overrides: expired,
    }
}
