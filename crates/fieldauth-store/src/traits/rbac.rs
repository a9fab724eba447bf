//! Role, permission, and override store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::{PermissionId, RoleId, UserId};
use fieldauth_entity::rbac::{Permission, PermissionKey, Role, UserPermissionOverride};

/// Read and write access to the RBAC tables.
#[async_trait]
pub trait RbacStore: Send + Sync + 'static {
    /// A counter that grows with every mutation able to change a user's
    /// effective permissions: roles, permissions, role mappings, overrides
    /// and identity activation or role reassignment.
    ///
    /// A mutation must be visible to readers before the counter moves, so
    /// a reader that loads the counter before the data never pairs new
    /// data with an old stamp unnoticed.
    async fn permissions_version(&self) -> AppResult<u64>;

    /// Find a role by ID.
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// List all roles.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// List all permissions.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Find a permission by its `resource:action` key.
    async fn find_permission_by_key(&self, key: &PermissionKey) -> AppResult<Option<Permission>>;

    /// Fetch the permissions with the given IDs. Unknown IDs are skipped.
    async fn find_permissions(&self, ids: &[PermissionId]) -> AppResult<Vec<Permission>>;

    /// Permissions mapped to a role, regardless of their active flag.
    async fn role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;

    /// Total number of role to permission mappings.
    async fn count_role_permissions(&self) -> AppResult<u64>;

    /// All overrides for one user, expired or not.
    async fn user_overrides(&self, user_id: UserId) -> AppResult<Vec<UserPermissionOverride>>;

    /// All overrides in the store.
    async fn list_overrides(&self) -> AppResult<Vec<UserPermissionOverride>>;

    /// Insert or replace the override for `(user, permission)`.
    async fn upsert_override(&self, override_: UserPermissionOverride) -> AppResult<()>;

    /// Delete the override for `(user, permission)`. Returns `true` if one existed.
    async fn delete_override(&self, user_id: UserId, permission_id: PermissionId)
    -> AppResult<bool>;

    /// Delete every override whose expiry lies before `now`.
    ///
    /// Returns the owning user of each removed override.
    async fn delete_expired_overrides(&self, now: DateTime<Utc>) -> AppResult<Vec<UserId>>;
}
