//! Password policy and hashing configuration.

use serde::{Deserialize, Serialize};

/// Password policy applied when a secret is changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Minimum password length.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
        }
    }
}

/// Argon2id cost parameters and the concurrency budget for hashing work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory")]
    pub memory_kib: u32,
    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    /// Output length in bytes.
    #[serde(default = "default_output_len")]
    pub output_len: usize,
    /// Maximum number of hash computations running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
            output_len: default_output_len(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_min_length() -> usize {
    8
}

fn default_memory() -> u32 {
    64 * 1024
}

fn default_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    2
}

fn default_output_len() -> usize {
    32
}

fn default_max_concurrent() -> usize {
    4
}
