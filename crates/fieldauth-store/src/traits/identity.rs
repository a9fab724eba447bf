//! Identity store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::identity::Identity;

/// Read and write access to identities.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Find an identity by username or email, ignoring ASCII case.
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<Identity>>;

    /// Find an identity by ID.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<Identity>>;

    /// Replace the stored password hash.
    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> AppResult<()>;

    /// Record a successful login.
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;
}
