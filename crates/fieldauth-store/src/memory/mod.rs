//! In-process implementation of every store port.
//!
//! Each record family lives in its own [`DashMap`]. Mutations that must be
//! atomic (device registration, refresh rotation) run under the map's
//! entry lock for the affected key. Device bindings are grouped per user so
//! that the live-binding cap is checked under the same lock as the insert.
//!
//! Every role, permission, mapping and override mutation bumps a version
//! counter after the write lands; permission caches stamp their entries
//! with it.

mod device;
mod identity;
mod lineage;
mod rbac;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;

use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::{LineageId, PermissionId, RoleId, UserId};
use fieldauth_entity::device::DeviceBinding;
use fieldauth_entity::identity::Identity;
use fieldauth_entity::lineage::LineageRecord;
use fieldauth_entity::rbac::{Permission, Role, UserPermissionOverride};

/// In-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    identities: DashMap<UserId, Identity>,
    roles: DashMap<RoleId, Role>,
    permissions: DashMap<PermissionId, Permission>,
    role_permissions: DashMap<RoleId, HashSet<PermissionId>>,
    overrides: DashMap<(UserId, PermissionId), UserPermissionOverride>,
    devices: DashMap<UserId, HashMap<String, DeviceBinding>>,
    lineages: DashMap<LineageId, LineageRecord>,
    permissions_version: AtomicU64,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, reachable store.
    pub fn new() -> Self {
        Self {
            identities: DashMap::new(),
            roles: DashMap::new(),
            permissions: DashMap::new(),
            role_permissions: DashMap::new(),
            overrides: DashMap::new(),
            devices: DashMap::new(),
            lineages: DashMap::new(),
            permissions_version: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage. While unavailable every port method fails with
    /// `StoreUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether the store currently accepts calls.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(AppError::store_unavailable("Store is unreachable"))
        }
    }

    fn bump_permissions_version(&self) {
        self.permissions_version.fetch_add(1, Ordering::SeqCst);
    }

    /// Insert or replace an identity.
    pub fn insert_identity(&self, identity: Identity) {
        self.identities.insert(identity.id, identity);
        self.bump_permissions_version();
    }

    /// Activate or deactivate an identity. Returns `false` if it does not exist.
    pub fn set_identity_active(&self, id: UserId, active: bool) -> bool {
        let found = match self.identities.get_mut(&id) {
            Some(mut identity) => {
                identity.is_active = active;
                identity.updated_at = chrono::Utc::now();
                true
            }
            None => false,
        };
        if found {
            self.bump_permissions_version();
        }
        found
    }

    /// Insert or replace a role.
    pub fn insert_role(&self, role: Role) {
        self.roles.insert(role.id, role);
        self.bump_permissions_version();
    }

    /// Insert or replace a permission.
    pub fn insert_permission(&self, permission: Permission) {
        self.permissions.insert(permission.id, permission);
        self.bump_permissions_version();
    }

    /// Activate or deactivate a role.
    pub fn set_role_active(&self, id: RoleId, active: bool) -> bool {
        let found = match self.roles.get_mut(&id) {
            Some(mut role) => {
                role.is_active = active;
                true
            }
            None => false,
        };
        if found {
            self.bump_permissions_version();
        }
        found
    }

    /// Activate or deactivate a permission.
    pub fn set_permission_active(&self, id: PermissionId, active: bool) -> bool {
        let found = match self.permissions.get_mut(&id) {
            Some(mut permission) => {
                permission.is_active = active;
                true
            }
            None => false,
        };
        if found {
            self.bump_permissions_version();
        }
        found
    }

    /// Map a permission into a role's baseline.
    pub fn grant_role_permission(&self, role_id: RoleId, permission_id: PermissionId) {
        self.role_permissions
            .entry(role_id)
            .or_default()
            .insert(permission_id);
        self.bump_permissions_version();
    }

    /// Remove a permission from a role's baseline.
    pub fn revoke_role_permission(&self, role_id: RoleId, permission_id: PermissionId) -> bool {
        let removed = self
            .role_permissions
            .get_mut(&role_id)
            .is_some_and(|mut set| set.remove(&permission_id));
        if removed {
            self.bump_permissions_version();
        }
        removed
    }
}
