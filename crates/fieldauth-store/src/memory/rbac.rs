//! [`RbacStore`] for [`MemoryStore`].

use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::{PermissionId, RoleId, UserId};
use fieldauth_entity::rbac::{Permission, PermissionKey, Role, UserPermissionOverride};

use super::MemoryStore;
use crate::traits::RbacStore;

#[async_trait]
impl RbacStore for MemoryStore {
    async fn permissions_version(&self) -> AppResult<u64> {
        self.ensure_available()?;
        Ok(self.permissions_version.load(Ordering::SeqCst))
    }

    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        self.ensure_available()?;
        Ok(self.roles.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.ensure_available()?;
        Ok(self.roles.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.ensure_available()?;
        Ok(self
            .permissions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_permission_by_key(&self, key: &PermissionKey) -> AppResult<Option<Permission>> {
        self.ensure_available()?;
        Ok(self
            .permissions
            .iter()
            .find(|entry| &entry.value().key == key)
            .map(|entry| entry.value().clone()))
    }

    async fn find_permissions(&self, ids: &[PermissionId]) -> AppResult<Vec<Permission>> {
        self.ensure_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.permissions.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        self.ensure_available()?;
        let ids: Vec<PermissionId> = self
            .role_permissions
            .get(&role_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.permissions.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn count_role_permissions(&self) -> AppResult<u64> {
        self.ensure_available()?;
        Ok(self
            .role_permissions
            .iter()
            .map(|entry| entry.value().len() as u64)
            .sum())
    }

    async fn user_overrides(&self, user_id: UserId) -> AppResult<Vec<UserPermissionOverride>> {
        self.ensure_available()?;
        Ok(self
            .overrides
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn list_overrides(&self) -> AppResult<Vec<UserPermissionOverride>> {
        self.ensure_available()?;
        Ok(self
            .overrides
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn upsert_override(&self, override_: UserPermissionOverride) -> AppResult<()> {
        self.ensure_available()?;
        self.overrides
            .insert((override_.user_id, override_.permission_id), override_);
        self.bump_permissions_version();
        Ok(())
    }

    async fn delete_override(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.ensure_available()?;
        let removed = self.overrides.remove(&(user_id, permission_id)).is_some();
        if removed {
            self.bump_permissions_version();
        }
        Ok(removed)
    }

    async fn delete_expired_overrides(&self, now: DateTime<Utc>) -> AppResult<Vec<UserId>> {
        self.ensure_available()?;
        let mut affected = Vec::new();
        self.overrides.retain(|(user_id, _), override_| {
            if override_.is_expired_at(now) {
                affected.push(*user_id);
                false
            } else {
                true
            }
        });
        if !affected.is_empty() {
            self.bump_permissions_version();
        }
        debug!(count = affected.len(), "Deleted expired permission overrides");
        Ok(affected)
    }
}
