//! Role entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::types::id::{CompanyId, RoleId};

/// A named role carrying a baseline set of permissions.
///
/// System roles are seeded and immutable; custom roles are editable by a
/// tenant administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Role code, e.g. `MANDOR`.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Owning tenant for custom roles.
    pub company_id: Option<CompanyId>,
    /// Seeded system role.
    pub is_system: bool,
    /// Inactive roles contribute no baseline permissions.
    pub is_active: bool,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Create an active system role.
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: None,
            company_id: None,
            is_system: true,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Create an active tenant-defined role.
    pub fn custom(name: impl Into<String>, company_id: Option<CompanyId>) -> Self {
        Self {
            is_system: false,
            company_id,
            ..Self::system(name)
        }
    }

    /// Custom roles are every role that is not system-defined.
    pub fn is_custom(&self) -> bool {
        !self.is_system
    }
}
