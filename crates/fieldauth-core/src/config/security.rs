//! Security event logging and permission cache configuration.

use serde::{Deserialize, Serialize};

/// Security audit log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityLogConfig {
    /// Whether security events are recorded at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Capacity of the queue between the decision path and the sinks.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for SecurityLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Effective-permission caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Whether resolved permission sets are cached.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    /// Upper bound on how long a resolved set is cached, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_cache_ttl() -> u64 {
    60
}
