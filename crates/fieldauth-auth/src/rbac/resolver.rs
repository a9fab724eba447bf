//! Permission resolver with cached effective sets.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fieldauth_cache::keys;
use fieldauth_cache::provider::CacheManager;
use fieldauth_core::config::RbacConfig;
use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::traits::cache::CacheProvider;
use fieldauth_core::types::id::{PermissionId, UserId};
use fieldauth_entity::identity::Identity;
use fieldauth_entity::rbac::{Permission, PermissionKey, RbacStatistics, UserPermissionOverride};
use fieldauth_store::{IdentityStore, RbacStore};

use super::effective::{EffectivePermissions, PermissionCheck, Resolution};
use super::stats;

/// A cached set stamped with the store's permissions version as read
/// before the set was resolved.
#[derive(Debug, Serialize, Deserialize)]
struct CachedPermissions {
    version: u64,
    set: EffectivePermissions,
}

/// Resolves the effective permission set of a user.
///
/// Sets are cached per user when a cache is configured. Every lookup reads
/// the identity and the store's permissions version; a cached set is only
/// served when its stamp matches the current version and the identity is
/// still active with the same role. Any store mutation to roles,
/// permissions, mappings or overrides therefore retires cached sets without
/// an explicit [`invalidate_user`](Self::invalidate_user).
#[derive(Clone)]
pub struct PermissionResolver {
    rbac: Arc<dyn RbacStore>,
    identities: Arc<dyn IdentityStore>,
    cache: Option<CacheManager>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("cached", &self.cache.is_some())
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl PermissionResolver {
    /// Creates a resolver. `cache` is only used when `config.cache_enabled`.
    pub fn new(
        config: &RbacConfig,
        rbac: Arc<dyn RbacStore>,
        identities: Arc<dyn IdentityStore>,
        cache: Option<CacheManager>,
    ) -> Self {
        Self {
            rbac,
            identities,
            cache: cache.filter(|_| config.cache_enabled),
            cache_ttl: Duration::from_secs(config.cache_ttl_seconds),
        }
    }

    async fn load_identity(&self, user_id: UserId) -> AppResult<Identity> {
        self.identities
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Identity {user_id} not found")))
    }

    async fn resolve(&self, identity: &Identity, now: DateTime<Utc>) -> AppResult<Resolution> {
        if !identity.is_active {
            return Ok(Resolution::default());
        }

        let role = self.rbac.find_role(identity.role_id).await?;
        let baseline = self.rbac.role_permissions(identity.role_id).await?;
        let overrides = self.rbac.user_overrides(identity.id).await?;

        let ids: Vec<PermissionId> = overrides.iter().map(|o| o.permission_id).collect();
        let override_permissions: HashMap<PermissionId, Permission> = self
            .rbac
            .find_permissions(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(Resolution::compute(
            role.as_ref(),
            &baseline,
            &overrides,
            &override_permissions,
            now,
        ))
    }

    async fn cached(
        &self,
        identity: &Identity,
        version: u64,
        now: DateTime<Utc>,
    ) -> Option<EffectivePermissions> {
        let cache = self.cache.as_ref()?;
        let key = keys::effective_permissions(identity.id.into_uuid());
        let cached: AppResult<Option<CachedPermissions>> = cache.get_json(&key).await;
        match cached {
            Ok(Some(entry))
                if entry.version == version
                    && entry.set.role_id == identity.role_id
                    && !entry.set.is_stale_at(now) =>
            {
                Some(entry.set)
            }
            Ok(Some(_)) => {
                let _ = cache.delete(&key).await;
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(user_id = %identity.id, error = %e, "Failed to read cached permissions");
                None
            }
        }
    }

    async fn store_cached(&self, set: &EffectivePermissions, version: u64, now: DateTime<Utc>) {
        let Some(cache) = &self.cache else {
            return;
        };
        let ttl = match set.valid_until {
            Some(until) => match (until - now).to_std() {
                Ok(remaining) if !remaining.is_zero() => remaining.min(self.cache_ttl),
                _ => return,
            },
            None => self.cache_ttl,
        };
        let key = keys::effective_permissions(set.user_id.into_uuid());
        let entry = CachedPermissions {
            version,
            set: set.clone(),
        };
        if let Err(e) = cache.set_json(&key, &entry, ttl).await {
            warn!(user_id = %set.user_id, error = %e, "Failed to cache permissions");
        }
    }

    /// Returns the user's effective permission set.
    ///
    /// A deactivated identity resolves to an empty set.
    pub async fn effective_permissions(&self, user_id: UserId) -> AppResult<EffectivePermissions> {
        let now = Utc::now();
        // Read before any RBAC data, so a write racing this resolution
        // leaves the stored entry with an outdated stamp.
        let version = self.rbac.permissions_version().await?;
        let identity = self.load_identity(user_id).await?;
        if !identity.is_active {
            return Ok(EffectivePermissions::empty(user_id, identity.role_id, now));
        }

        if let Some(set) = self.cached(&identity, version, now).await {
            debug!(user_id = %user_id, version, "Effective permissions served from cache");
            return Ok(set);
        }

        let set = self
            .resolve(&identity, now)
            .await?
            .into_effective(user_id, identity.role_id, now);
        self.store_cached(&set, version, now).await;
        Ok(set)
    }

    /// Checks a single permission.
    pub async fn check(&self, user_id: UserId, key: &PermissionKey) -> AppResult<bool> {
        Ok(self.effective_permissions(user_id).await?.allows(key))
    }

    /// Whether the user holds at least one of `keys`.
    pub async fn has_any(&self, user_id: UserId, keys: &[PermissionKey]) -> AppResult<bool> {
        let set = self.effective_permissions(user_id).await?;
        Ok(keys.iter().any(|k| set.allows(k)))
    }

    /// Whether the user holds every one of `keys`.
    pub async fn has_all(&self, user_id: UserId, keys: &[PermissionKey]) -> AppResult<bool> {
        let set = self.effective_permissions(user_id).await?;
        Ok(keys.iter().all(|k| set.allows(k)))
    }

    /// Checks a permission and reports which rule decided it. Always
    /// computed from the store, never from cache.
    pub async fn check_with_reason(
        &self,
        user_id: UserId,
        key: &PermissionKey,
    ) -> AppResult<PermissionCheck> {
        let identity = self.load_identity(user_id).await?;
        let resolution = self.resolve(&identity, Utc::now()).await?;
        Ok(resolution.explain(key))
    }

    /// Creates or replaces the user's override for `key`.
    pub async fn assign_override(
        &self,
        user_id: UserId,
        key: &PermissionKey,
        is_granted: bool,
        expires_at: Option<DateTime<Utc>>,
        created_by: Option<UserId>,
    ) -> AppResult<UserPermissionOverride> {
        if expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(AppError::validation("Override expiry must be in the future"));
        }
        self.load_identity(user_id).await?;
        let permission = self
            .rbac
            .find_permission_by_key(key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Permission '{key}' not found")))?;

        let mut override_ = if is_granted {
            UserPermissionOverride::grant(user_id, permission.id, expires_at)
        } else {
            UserPermissionOverride::deny(user_id, permission.id, expires_at)
        };
        override_.created_by = created_by;

        self.rbac.upsert_override(override_.clone()).await?;
        self.invalidate_user(user_id).await;

        info!(
            user_id = %user_id,
            permission = %key,
            is_granted,
            "Permission override assigned"
        );
        Ok(override_)
    }

    /// Removes the user's override for `key`. Returns `false` if none existed.
    pub async fn remove_override(&self, user_id: UserId, key: &PermissionKey) -> AppResult<bool> {
        let Some(permission) = self.rbac.find_permission_by_key(key).await? else {
            return Ok(false);
        };
        let removed = self.rbac.delete_override(user_id, permission.id).await?;
        if removed {
            self.invalidate_user(user_id).await;
            info!(user_id = %user_id, permission = %key, "Permission override removed");
        }
        Ok(removed)
    }

    /// Deletes every expired override and drops the affected users' cached
    /// sets. Returns the number of overrides removed.
    pub async fn cleanup_expired_overrides(&self) -> AppResult<u64> {
        let owners = self.rbac.delete_expired_overrides(Utc::now()).await?;
        let users: HashSet<UserId> = owners.iter().copied().collect();
        for user_id in &users {
            self.invalidate_user(*user_id).await;
        }
        if !owners.is_empty() {
            info!(
                removed = owners.len(),
                users = users.len(),
                "Cleaned up expired permission overrides"
            );
        }
        Ok(owners.len() as u64)
    }

    /// Drops one user's cached set.
    pub async fn invalidate_user(&self, user_id: UserId) {
        if let Some(cache) = &self.cache {
            let key = keys::effective_permissions(user_id.into_uuid());
            if let Err(e) = cache.delete(&key).await {
                warn!(user_id = %user_id, error = %e, "Failed to invalidate cached permissions");
            }
        }
    }

    /// Drops every cached set.
    pub async fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            match cache.delete_pattern(&keys::effective_permissions_pattern()).await {
                Ok(count) => debug!(count, "Invalidated all cached permissions"),
                Err(e) => warn!(error = %e, "Failed to invalidate cached permissions"),
            }
        }
    }

    /// Read-only counts over roles, permissions and overrides.
    pub async fn statistics(&self) -> AppResult<RbacStatistics> {
        let roles = self.rbac.list_roles().await?;
        let permissions = self.rbac.list_permissions().await?;
        let mappings = self.rbac.count_role_permissions().await?;
        let overrides = self.rbac.list_overrides().await?;
        Ok(stats::compute(
            &roles,
            &permissions,
            mappings,
            &overrides,
            Utc::now(),
        ))
    }
}
