//! [`LineageStore`] for [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::{LineageId, UserId};
use fieldauth_entity::lineage::LineageRecord;

use super::MemoryStore;
use crate::traits::LineageStore;

#[async_trait]
impl LineageStore for MemoryStore {
    async fn insert_lineage(&self, record: LineageRecord) -> AppResult<()> {
        self.ensure_available()?;
        if self.lineages.contains_key(&record.id) {
            return Err(AppError::conflict(format!(
                "Lineage {} already exists",
                record.id
            )));
        }
        self.lineages.insert(record.id, record);
        Ok(())
    }

    async fn find_lineage(&self, id: LineageId) -> AppResult<Option<LineageRecord>> {
        self.ensure_available()?;
        Ok(self.lineages.get(&id).map(|entry| entry.value().clone()))
    }

    async fn rotate_lineage(
        &self,
        id: LineageId,
        expected_jti: &str,
        new_jti: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_available()?;
        // get_mut holds the shard write lock for the whole compare-and-swap.
        let Some(mut record) = self.lineages.get_mut(&id) else {
            return Ok(false);
        };
        if record.revoked || record.current_refresh_jti != expected_jti {
            return Ok(false);
        }
        record.current_refresh_jti = new_jti.to_string();
        record.rotated_at = Some(Utc::now());
        if new_expires_at > record.expires_at {
            record.expires_at = new_expires_at;
        }
        Ok(true)
    }

    async fn revoke_lineage(&self, id: LineageId, at: DateTime<Utc>) -> AppResult<bool> {
        self.ensure_available()?;
        match self.lineages.get_mut(&id) {
            Some(mut record) => {
                if !record.revoked {
                    record.revoked = true;
                    record.revoked_at = Some(at);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_user_lineages(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        self.ensure_available()?;
        let mut revoked = 0u64;
        for mut entry in self.lineages.iter_mut() {
            let record = entry.value_mut();
            if record.user_id == user_id && !record.revoked {
                record.revoked = true;
                record.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge_expired_lineages(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.ensure_available()?;
        let before = self.lineages.len();
        self.lineages.retain(|_, record| !record.is_purgeable(now));
        let purged = before.saturating_sub(self.lineages.len()) as u64;
        debug!(purged, "Purged expired lineage records");
        Ok(purged)
    }
}
