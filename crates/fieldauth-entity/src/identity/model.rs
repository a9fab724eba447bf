//! Identity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::types::id::{CompanyId, RoleId, UserId};

/// A registered user of the operational application.
///
/// Identities are never deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Argon2id PHC-format password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Assigned role.
    pub role_id: RoleId,
    /// Owning company (tenant), if any.
    pub company_id: Option<CompanyId>,
    /// Deactivated identities cannot log in or refresh.
    pub is_active: bool,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Create an active identity.
    pub fn new(
        username: impl Into<String>,
        email: Option<String>,
        password_hash: impl Into<String>,
        role_id: RoleId,
        company_id: Option<CompanyId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username: username.into(),
            email,
            password_hash: password_hash.into(),
            role_id,
            company_id,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Check whether `identifier` names this identity, by username or
    /// email, ignoring ASCII case.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.username.eq_ignore_ascii_case(identifier)
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.eq_ignore_ascii_case(identifier))
    }
}
