//! Device binding entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldauth_core::types::id::UserId;

use super::platform::Platform;

/// A registered (user, device id) pair.
///
/// At most one binding exists per (user, device id). A revoked binding is
/// kept so the device cannot silently re-register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// The bound user.
    pub user_id: UserId,
    /// Client-reported device identifier.
    pub device_id: String,
    /// Hex SHA-256 digest of the fingerprint presented at registration.
    pub fingerprint_hash: String,
    /// Platform reported at registration.
    pub platform: Platform,
    /// When the binding was registered.
    pub registered_at: DateTime<Utc>,
    /// Last successful validation.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Whether an administrator revoked the binding.
    pub revoked: bool,
    /// When the binding was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl DeviceBinding {
    /// Create a fresh, non-revoked binding.
    pub fn new(
        user_id: UserId,
        device_id: impl Into<String>,
        fingerprint_hash: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            user_id,
            device_id: device_id.into(),
            fingerprint_hash: fingerprint_hash.into(),
            platform,
            registered_at: Utc::now(),
            last_seen_at: None,
            revoked: false,
            revoked_at: None,
        }
    }
}

/// Device information supplied by a client alongside its credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceContext {
    /// Client-reported device identifier.
    pub device_id: String,
    /// Raw device fingerprint as computed by the client.
    pub fingerprint: String,
    /// Client platform.
    pub platform: Platform,
}

impl DeviceContext {
    /// Build a device context.
    pub fn new(
        device_id: impl Into<String>,
        fingerprint: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            fingerprint: fingerprint.into(),
            platform,
        }
    }
}
