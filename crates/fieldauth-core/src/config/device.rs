//! Device binding configuration.

use serde::{Deserialize, Serialize};

/// Limits on mobile device bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Live (non-revoked) bindings a single user may hold. A new device
    /// beyond this count is refused until an existing one is revoked.
    #[serde(default = "default_max_devices")]
    pub max_devices_per_user: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_devices_per_user: default_max_devices(),
        }
    }
}

fn default_max_devices() -> usize {
    5
}
