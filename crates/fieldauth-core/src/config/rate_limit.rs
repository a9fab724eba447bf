//! Rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Fixed-window limits for login attempts and sensitive operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts allowed per (identifier, source address) per window.
    #[serde(default = "default_login_max")]
    pub login_max_attempts: u32,
    /// Login window length in seconds.
    #[serde(default = "default_login_window")]
    pub login_window_seconds: u64,
    /// Lockout applied once the login limit is exceeded, in seconds.
    #[serde(default = "default_lockout")]
    pub lockout_seconds: u64,
    /// Sensitive operations allowed per (user, operation) per window.
    #[serde(default = "default_operation_max")]
    pub operation_max_attempts: u32,
    /// Sensitive operation window length in seconds.
    #[serde(default = "default_operation_window")]
    pub operation_window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max_attempts: default_login_max(),
            login_window_seconds: default_login_window(),
            lockout_seconds: default_lockout(),
            operation_max_attempts: default_operation_max(),
            operation_window_seconds: default_operation_window(),
        }
    }
}

fn default_login_max() -> u32 {
    5
}

fn default_login_window() -> u64 {
    15 * 60
}

fn default_lockout() -> u64 {
    30 * 60
}

fn default_operation_max() -> u32 {
    10
}

fn default_operation_window() -> u64 {
    5 * 60
}
