//! Permission entity model and permission keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::AppError;
use fieldauth_core::types::id::PermissionId;

/// A `resource:action` pair such as `harvest:approve`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey {
    resource: String,
    action: String,
}

impl PermissionKey {
    /// Build a key from its parts. Both parts must be non-empty and free
    /// of `:`.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Result<Self, AppError> {
        let resource = resource.into().trim().to_lowercase();
        let action = action.into().trim().to_lowercase();
        if resource.is_empty() || action.is_empty() {
            return Err(AppError::validation(
                "Permission resource and action must not be empty",
            ));
        }
        if resource.contains(':') || action.contains(':') {
            return Err(AppError::validation(
                "Permission resource and action must not contain ':'",
            ));
        }
        Ok(Self { resource, action })
    }

    /// The resource part.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The action part.
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((resource, action)) => Self::new(resource, action),
            None => Err(AppError::validation(format!(
                "Invalid permission key: '{s}'. Expected 'resource:action'"
            ))),
        }
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.to_string()
    }
}

/// A grantable capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: PermissionId,
    /// The `resource:action` pair.
    pub key: PermissionKey,
    /// Human-readable description.
    pub description: Option<String>,
    /// Inactive permissions are never part of an effective set.
    pub is_active: bool,
    /// When the permission was created.
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Create an active permission.
    pub fn new(key: PermissionKey) -> Self {
        Self {
            id: PermissionId::new(),
            key,
            description: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
