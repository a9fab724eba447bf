//! [`DeviceStore`] for [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::device::DeviceBinding;

use super::MemoryStore;
use crate::traits::{DeviceStore, InsertOutcome};

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn find_binding(
        &self,
        user_id: UserId,
        device_id: &str,
    ) -> AppResult<Option<DeviceBinding>> {
        self.ensure_available()?;
        Ok(self
            .devices
            .get(&user_id)
            .and_then(|bindings| bindings.get(device_id).cloned()))
    }

    async fn insert_binding_if_absent(
        &self,
        binding: DeviceBinding,
        max_active: usize,
    ) -> AppResult<InsertOutcome<DeviceBinding>> {
        self.ensure_available()?;
        let mut bindings = self.devices.entry(binding.user_id).or_default();
        if let Some(existing) = bindings.get(&binding.device_id) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        let active = bindings.values().filter(|b| !b.revoked).count();
        if active >= max_active {
            return Ok(InsertOutcome::LimitReached { active });
        }
        bindings.insert(binding.device_id.clone(), binding);
        Ok(InsertOutcome::Inserted)
    }

    async fn revoke_binding(
        &self,
        user_id: UserId,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_available()?;
        let Some(mut bindings) = self.devices.get_mut(&user_id) else {
            return Ok(false);
        };
        match bindings.get_mut(device_id) {
            Some(binding) => {
                if !binding.revoked {
                    binding.revoked = true;
                    binding.revoked_at = Some(at);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_binding(
        &self,
        user_id: UserId,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.ensure_available()?;
        if let Some(mut bindings) = self.devices.get_mut(&user_id) {
            if let Some(binding) = bindings.get_mut(device_id) {
                binding.last_seen_at = Some(at);
            }
        }
        Ok(())
    }

    async fn list_bindings(&self, user_id: UserId) -> AppResult<Vec<DeviceBinding>> {
        self.ensure_available()?;
        let mut bindings: Vec<DeviceBinding> = self
            .devices
            .get(&user_id)
            .map(|entry| entry.values().cloned().collect())
            .unwrap_or_default();
        bindings.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldauth_entity::device::Platform;

    #[tokio::test]
    async fn test_second_insert_sees_first_binding() {
        let store = MemoryStore::new();
        let user = UserId::new();

        let first = DeviceBinding::new(user, "dev-1", "aaaa", Platform::Android);
        let second = DeviceBinding::new(user, "dev-1", "bbbb", Platform::Android);

        assert!(matches!(
            store.insert_binding_if_absent(first, 5).await.unwrap(),
            InsertOutcome::Inserted
        ));
        match store.insert_binding_if_absent(second, 5).await.unwrap() {
            InsertOutcome::Existing(existing) => assert_eq!(existing.fingerprint_hash, "aaaa"),
            other => panic!("second registration must not overwrite: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_revoke_is_visible_immediately() {
        let store = MemoryStore::new();
        let user = UserId::new();
        store
            .insert_binding_if_absent(DeviceBinding::new(user, "dev-2", "cccc", Platform::Ios), 5)
            .await
            .unwrap();

        assert!(store.revoke_binding(user, "dev-2", Utc::now()).await.unwrap());
        let binding = store.find_binding(user, "dev-2").await.unwrap().unwrap();
        assert!(binding.revoked);
        assert!(!store.revoke_binding(user, "missing", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_live_binding_cap_counts_only_unrevoked() {
        let store = MemoryStore::new();
        let user = UserId::new();
        for device in ["dev-a", "dev-b"] {
            let binding = DeviceBinding::new(user, device, "dddd", Platform::Android);
            assert!(matches!(
                store.insert_binding_if_absent(binding, 2).await.unwrap(),
                InsertOutcome::Inserted
            ));
        }

        let third = DeviceBinding::new(user, "dev-c", "eeee", Platform::Android);
        assert!(matches!(
            store.insert_binding_if_absent(third.clone(), 2).await.unwrap(),
            InsertOutcome::LimitReached { active: 2 }
        ));

        store.revoke_binding(user, "dev-a", Utc::now()).await.unwrap();
        assert!(matches!(
            store.insert_binding_if_absent(third, 2).await.unwrap(),
            InsertOutcome::Inserted
        ));
        assert_eq!(store.list_bindings(user).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_existing_device_is_returned_even_at_cap() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let binding = DeviceBinding::new(user, "dev-a", "ffff", Platform::Ios);
        store
            .insert_binding_if_absent(binding.clone(), 1)
            .await
            .unwrap();

        match store.insert_binding_if_absent(binding, 1).await.unwrap() {
            InsertOutcome::Existing(existing) => assert_eq!(existing.device_id, "dev-a"),
            other => panic!("expected the existing binding, got {other:?}"),
        }
    }
}
