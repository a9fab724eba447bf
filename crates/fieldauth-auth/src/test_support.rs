//! Shared fixtures for unit tests.

use fieldauth_core::config::{AppConfig, HashingConfig};
use fieldauth_core::types::id::{RoleId, UserId};
use fieldauth_entity::identity::Identity;
use fieldauth_store::MemoryStore;

use crate::credential::CredentialHasher;

/// Argon2 parameters cheap enough for tests.
pub fn cheap_hashing() -> HashingConfig {
    HashingConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        output_len: 32,
        max_concurrent: 4,
    }
}

/// Default configuration with cheap hashing.
pub fn test_config() -> AppConfig {
    AppConfig {
        hashing: cheap_hashing(),
        ..AppConfig::default()
    }
}

/// Inserts an active identity with a real hash of `secret`.
pub async fn seed_identity(
    store: &MemoryStore,
    hasher: &CredentialHasher,
    username: &str,
    secret: &str,
    role_id: RoleId,
) -> UserId {
    let hash = hasher.hash(secret).await.unwrap();
    let identity = Identity::new(
        username,
        Some(format!("{username}@estate.example")),
        hash,
        role_id,
        None,
    );
    let id = identity.id;
    store.insert_identity(identity);
    id
}

/// Inserts an active identity whose hash is never verified.
pub fn seed_plain_identity(store: &MemoryStore, username: &str) -> Identity {
    let identity = Identity::new(username, None, "$argon2id$unused", RoleId::new(), None);
    store.insert_identity(identity.clone());
    identity
}
