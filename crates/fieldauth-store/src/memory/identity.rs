//! [`IdentityStore`] for [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::identity::Identity;

use super::MemoryStore;
use crate::traits::IdentityStore;

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<Identity>> {
        self.ensure_available()?;
        Ok(self
            .identities
            .iter()
            .find(|entry| entry.value().matches_identifier(identifier))
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<Identity>> {
        self.ensure_available()?;
        Ok(self.identities.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> AppResult<()> {
        self.ensure_available()?;
        let mut identity = self
            .identities
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Identity {id} not found")))?;
        identity.password_hash = password_hash.to_string();
        identity.updated_at = Utc::now();
        Ok(())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        self.ensure_available()?;
        if let Some(mut identity) = self.identities.get_mut(&id) {
            identity.last_login_at = Some(at);
        }
        Ok(())
    }
}
