//! Lineage revocation-marker store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::{LineageId, UserId};
use fieldauth_entity::lineage::LineageRecord;

/// Read and write access to lineage records.
#[async_trait]
pub trait LineageStore: Send + Sync + 'static {
    /// Insert a new lineage record.
    async fn insert_lineage(&self, record: LineageRecord) -> AppResult<()>;

    /// Find a lineage record by ID.
    async fn find_lineage(&self, id: LineageId) -> AppResult<Option<LineageRecord>>;

    /// Compare-and-swap the current refresh `jti`.
    ///
    /// Succeeds only if the lineage exists, is not revoked, and its current
    /// `jti` equals `expected_jti`. Exactly one of several concurrent calls
    /// with the same `expected_jti` can return `true`.
    async fn rotate_lineage(
        &self,
        id: LineageId,
        expected_jti: &str,
        new_jti: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Revoke one lineage. Returns `false` if it does not exist.
    async fn revoke_lineage(&self, id: LineageId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every live lineage of a user. Returns how many were revoked.
    async fn revoke_user_lineages(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64>;

    /// Delete lineage records whose `expires_at` lies before `now`.
    async fn purge_expired_lineages(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
