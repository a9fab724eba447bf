//! Device binding validation against the device store.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fieldauth_core::config::DeviceConfig;
use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::device::{DeviceBinding, DeviceContext};
use fieldauth_store::{DeviceStore, InsertOutcome};

use super::trust::{TrustDecision, TrustState, decide, hash_fingerprint};

/// Successful validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceVerification {
    /// The device was seen for the first time and is now bound.
    Registered,
    /// The device matched its existing binding.
    Verified,
}

/// Validates client device fingerprints.
///
/// Every call reads the store directly so that an administrative
/// revocation is observed by the next validation.
#[derive(Clone)]
pub struct DeviceBindingValidator {
    store: Arc<dyn DeviceStore>,
    max_devices: usize,
}

impl std::fmt::Debug for DeviceBindingValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBindingValidator")
            .field("max_devices", &self.max_devices)
            .finish()
    }
}

impl DeviceBindingValidator {
    /// Creates a new validator.
    pub fn new(config: &DeviceConfig, store: Arc<dyn DeviceStore>) -> Self {
        Self {
            store,
            max_devices: config.max_devices_per_user,
        }
    }

    /// Validates `device` for `user_id`, binding it on first use.
    ///
    /// A first-seen device is refused with `DeviceLimitExceeded` while the
    /// user already holds the configured number of live bindings.
    pub async fn validate(
        &self,
        user_id: UserId,
        device: &DeviceContext,
    ) -> AppResult<DeviceVerification> {
        let presented = hash_fingerprint(&device.fingerprint);
        let existing = self.store.find_binding(user_id, &device.device_id).await?;

        let binding = match decide(existing.as_ref(), &presented) {
            TrustDecision::Register => {
                let fresh = DeviceBinding::new(
                    user_id,
                    device.device_id.clone(),
                    presented.clone(),
                    device.platform,
                );
                match self
                    .store
                    .insert_binding_if_absent(fresh, self.max_devices)
                    .await?
                {
                    InsertOutcome::Inserted => {
                        info!(
                            user_id = %user_id,
                            device_id = %device.device_id,
                            platform = %device.platform,
                            "Device bound on first use"
                        );
                        return Ok(DeviceVerification::Registered);
                    }
                    // Lost a registration race; judge against the winner.
                    InsertOutcome::Existing(winner) => winner,
                    InsertOutcome::LimitReached { active } => {
                        warn!(
                            user_id = %user_id,
                            device_id = %device.device_id,
                            active,
                            limit = self.max_devices,
                            "Device binding refused, limit reached"
                        );
                        return Err(AppError::device_limit_exceeded(format!(
                            "At most {} devices may be bound",
                            self.max_devices
                        )));
                    }
                }
            }
            _ => existing.ok_or_else(|| AppError::internal("Binding vanished during validation"))?,
        };

        match decide(Some(&binding), &presented) {
            TrustDecision::Accept => {
                if let Err(e) = self
                    .store
                    .touch_binding(user_id, &device.device_id, Utc::now())
                    .await
                {
                    warn!(user_id = %user_id, error = %e, "Failed to record device activity");
                }
                Ok(DeviceVerification::Verified)
            }
            TrustDecision::RejectRevoked => {
                Err(AppError::device_revoked("Device binding has been revoked"))
            }
            TrustDecision::RejectMismatch | TrustDecision::Register => Err(
                AppError::device_mismatch("Device fingerprint does not match its binding"),
            ),
        }
    }

    /// Fails with `DeviceRevoked` unless a live binding exists for
    /// `(user_id, device_id)`.
    pub async fn ensure_not_revoked(&self, user_id: UserId, device_id: &str) -> AppResult<()> {
        let binding = self.store.find_binding(user_id, device_id).await?;
        match TrustState::of(binding.as_ref()) {
            TrustState::Bound => Ok(()),
            TrustState::Revoked | TrustState::Unregistered => {
                Err(AppError::device_revoked("Device binding has been revoked"))
            }
        }
    }

    /// Revokes the binding for `(user_id, device_id)`.
    pub async fn revoke(&self, user_id: UserId, device_id: &str) -> AppResult<()> {
        if !self
            .store
            .revoke_binding(user_id, device_id, Utc::now())
            .await?
        {
            return Err(AppError::not_found(format!(
                "No binding for device '{device_id}'"
            )));
        }
        info!(user_id = %user_id, device_id = %device_id, "Device binding revoked");
        Ok(())
    }

    /// Lists a user's bindings, revoked ones included.
    pub async fn list(&self, user_id: UserId) -> AppResult<Vec<DeviceBinding>> {
        self.store.list_bindings(user_id).await
    }
}
