//! The immutable effective-permission value object.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::types::id::{PermissionId, RoleId, UserId};
use fieldauth_entity::rbac::{Permission, PermissionKey, Role, UserPermissionOverride};

/// The capability set of one user at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// The user the set belongs to.
    pub user_id: UserId,
    /// The user's role at computation time.
    pub role_id: RoleId,
    /// Granted permission keys, sorted.
    pub permissions: BTreeSet<PermissionKey>,
    /// When the set was computed.
    pub computed_at: DateTime<Utc>,
    /// Earliest expiry among the overrides that shaped the set. After this
    /// instant the set may be wrong and must be recomputed.
    pub valid_until: Option<DateTime<Utc>>,
}

impl EffectivePermissions {
    /// An empty set, used for deactivated identities.
    pub fn empty(user_id: UserId, role_id: RoleId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            role_id,
            permissions: BTreeSet::new(),
            computed_at: now,
            valid_until: None,
        }
    }

    /// Whether the set contains `key`.
    pub fn allows(&self, key: &PermissionKey) -> bool {
        self.permissions.contains(key)
    }

    /// Whether the set must no longer be served at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }

    /// Number of granted permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Whether nothing is granted.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Permission keys rendered as `resource:action` strings.
    pub fn keys(&self) -> Vec<String> {
        self.permissions.iter().map(ToString::to_string).collect()
    }
}

/// Why a permission check came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckReason {
    /// Granted by the role baseline.
    RoleBaseline,
    /// Granted by a user grant override.
    GrantOverride,
    /// Removed by a user deny override.
    DenyOverride,
    /// Neither the role nor any override grants it.
    NotGranted,
}

/// Result of [`PermissionResolver::check_with_reason`](super::PermissionResolver::check_with_reason).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheck {
    /// Whether the permission is held.
    pub allowed: bool,
    /// Which rule decided it.
    pub reason: CheckReason,
}

/// The three contributing sets, kept apart for diagnostics.
#[derive(Debug, Clone, Default)]
pub(crate) struct Resolution {
    pub baseline: BTreeSet<PermissionKey>,
    pub granted: BTreeSet<PermissionKey>,
    pub denied: BTreeSet<PermissionKey>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Resolution {
    /// Combine role baseline and overrides as of `now`.
    ///
    /// `override_permissions` must contain the permission row of every
    /// override; overrides whose permission is missing are ignored.
    pub fn compute(
        role: Option<&Role>,
        baseline: &[Permission],
        overrides: &[UserPermissionOverride],
        override_permissions: &HashMap<PermissionId, Permission>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut resolution = Self::default();

        if role.is_some_and(|r| r.is_active) {
            resolution.baseline = baseline
                .iter()
                .filter(|p| p.is_active)
                .map(|p| p.key.clone())
                .collect();
        }

        for o in overrides.iter().filter(|o| o.is_active_at(now)) {
            let Some(permission) = override_permissions.get(&o.permission_id) else {
                continue;
            };
            if o.is_granted {
                if !permission.is_active {
                    continue;
                }
                resolution.granted.insert(permission.key.clone());
            } else {
                resolution.denied.insert(permission.key.clone());
            }
            if let Some(expires_at) = o.expires_at {
                resolution.valid_until = Some(match resolution.valid_until {
                    Some(current) => current.min(expires_at),
                    None => expires_at,
                });
            }
        }

        resolution
    }

    /// The effective set: baseline plus grants, minus denies.
    pub fn effective(&self) -> BTreeSet<PermissionKey> {
        self.baseline
            .union(&self.granted)
            .filter(|key| !self.denied.contains(*key))
            .cloned()
            .collect()
    }

    /// Explain the outcome for one key.
    pub fn explain(&self, key: &PermissionKey) -> PermissionCheck {
        let reason = if self.denied.contains(key) {
            CheckReason::DenyOverride
        } else if self.baseline.contains(key) {
            CheckReason::RoleBaseline
        } else if self.granted.contains(key) {
            CheckReason::GrantOverride
        } else {
            CheckReason::NotGranted
        };
        PermissionCheck {
            allowed: matches!(reason, CheckReason::RoleBaseline | CheckReason::GrantOverride),
            reason,
        }
    }

    /// Freeze into the value object.
    pub fn into_effective(
        self,
        user_id: UserId,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> EffectivePermissions {
        EffectivePermissions {
            user_id,
            role_id,
            permissions: self.effective(),
            computed_at: now,
            valid_until: self.valid_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn perm(key: &str) -> Permission {
        Permission::new(key.parse().unwrap())
    }

    fn index(perms: &[&Permission]) -> HashMap<PermissionId, Permission> {
        perms.iter().map(|p| (p.id, (*p).clone())).collect()
    }

    #[test]
    fn test_expired_grant_is_ignored() {
        let now = Utc::now();
        let user = UserId::new();
        let role = Role::system("MANDOR");
        let read = perm("harvest:read");
        let approve = perm("harvest:approve");
        let lapsed = UserPermissionOverride::grant(user, approve.id, Some(now - Duration::hours(1)));

        let res = Resolution::compute(
            Some(&role),
            &[read.clone()],
            &[lapsed],
            &index(&[&approve]),
            now,
        );
        let effective = res.into_effective(user, role.id, now);

        assert!(effective.allows(&read.key));
        assert!(!effective.allows(&approve.key));
        assert_eq!(effective.valid_until, None);
    }

    #[test]
    fn test_deny_beats_baseline_and_grant() {
        let now = Utc::now();
        let user = UserId::new();
        let role = Role::system("ASISTEN");
        let read = perm("harvest:read");
        let overrides = vec![
            UserPermissionOverride::grant(user, read.id, None),
            UserPermissionOverride::deny(user, read.id, None),
        ];

        let res = Resolution::compute(Some(&role), &[read.clone()], &overrides, &index(&[&read]), now);

        assert!(res.effective().is_empty());
        assert_eq!(res.explain(&read.key).reason, CheckReason::DenyOverride);
        assert!(!res.explain(&read.key).allowed);
    }

    #[test]
    fn test_inactive_role_and_permission_excluded() {
        let now = Utc::now();
        let user = UserId::new();
        let mut role = Role::system("KRANI");
        let read = perm("block:read");
        let mut retired = perm("block:write");
        retired.is_active = false;

        let res = Resolution::compute(
            Some(&role),
            &[read.clone(), retired.clone()],
            &[UserPermissionOverride::grant(user, retired.id, None)],
            &index(&[&retired]),
            now,
        );
        assert_eq!(res.effective().len(), 1);
        assert!(res.effective().contains(&read.key));

        role.is_active = false;
        let res = Resolution::compute(Some(&role), &[read.clone()], &[], &HashMap::new(), now);
        assert!(res.effective().is_empty());
    }

    #[test]
    fn test_valid_until_is_earliest_override_expiry() {
        let now = Utc::now();
        let user = UserId::new();
        let role = Role::system("MANAGER");
        let a = perm("report:export");
        let b = perm("harvest:approve");
        let soon = now + Duration::minutes(5);
        let later = now + Duration::hours(2);
        let overrides = vec![
            UserPermissionOverride::grant(user, a.id, Some(later)),
            UserPermissionOverride::deny(user, b.id, Some(soon)),
        ];

        let res = Resolution::compute(Some(&role), &[], &overrides, &index(&[&a, &b]), now);
        let effective = res.into_effective(user, role.id, now);

        assert_eq!(effective.valid_until, Some(soon));
        assert!(!effective.is_stale_at(soon));
        assert!(effective.is_stale_at(soon + Duration::seconds(1)));
    }

    #[test]
    fn test_grant_reason_when_not_in_baseline() {
        let now = Utc::now();
        let user = UserId::new();
        let role = Role::system("MANDOR");
        let approve = perm("harvest:approve");

        let res = Resolution::compute(
            Some(&role),
            &[],
            &[UserPermissionOverride::grant(user, approve.id, None)],
            &index(&[&approve]),
            now,
        );
        let check = res.explain(&approve.key);
        assert!(check.allowed);
        assert_eq!(check.reason, CheckReason::GrantOverride);
        assert_eq!(
            res.explain(&"block:read".parse().unwrap()).reason,
            CheckReason::NotGranted
        );
    }
}
