//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use fieldauth::AuthEngine;
use fieldauth_auth::{CredentialHasher, MemorySink, SecuritySink, SessionResult};
use fieldauth_core::config::{AppConfig, HashingConfig};
use fieldauth_core::events::{SecurityEvent, SecurityEventType};
use fieldauth_core::types::id::{RoleId, UserId};
use fieldauth_entity::identity::Identity;
use fieldauth_entity::rbac::{Permission, Role};
use fieldauth_store::MemoryStore;

/// Password every seeded user starts with.
pub const PASSWORD: &str = "Sawit#Panen2024";

/// Test application context
pub struct TestApp {
    /// The engine under test
    pub engine: AuthEngine,
    /// Backing store for direct setup and fault injection
    pub store: Arc<MemoryStore>,
    /// Captures every forwarded security event
    pub sink: Arc<MemorySink>,
    /// Seeded MANDOR role, baseline `harvest:read`
    pub mandor: RoleId,
    /// Seeded MANAGER role, baseline `harvest:read` and `harvest:approve`
    pub manager: RoleId,
    hasher: CredentialHasher,
}

/// Configuration with Argon2 parameters cheap enough for tests.
pub fn test_config() -> AppConfig {
    AppConfig {
        hashing: HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
            max_concurrent: 4,
        },
        ..AppConfig::default()
    }
}

impl TestApp {
    /// Create a new test application with default test configuration
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with the given configuration
    pub async fn with_config(config: AppConfig) -> Self {
        Self::with_sinks(config, Vec::new()).await
    }

    /// Create a new test application forwarding events to extra sinks too
    pub async fn with_sinks(config: AppConfig, mut sinks: Vec<Arc<dyn SecuritySink>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(MemorySink::new());
        sinks.push(sink.clone());

        let mandor = Role::system("MANDOR");
        let manager = Role::system("MANAGER");
        let read = Permission::new("harvest:read".parse().unwrap());
        let approve = Permission::new("harvest:approve".parse().unwrap());
        let export = Permission::new("report:export".parse().unwrap());
        for role in [&mandor, &manager] {
            store.insert_role(role.clone());
        }
        for permission in [&read, &approve, &export] {
            store.insert_permission(permission.clone());
        }
        store.grant_role_permission(mandor.id, read.id);
        store.grant_role_permission(manager.id, read.id);
        store.grant_role_permission(manager.id, approve.id);

        let hasher = CredentialHasher::new(&config.hashing).unwrap();
        let engine = AuthEngine::build_with_sinks(config, store.clone(), sinks).unwrap();

        Self {
            engine,
            store,
            sink,
            mandor: mandor.id,
            manager: manager.id,
            hasher,
        }
    }

    /// Create an active user with [`PASSWORD`]
    pub async fn create_user(&self, username: &str, role_id: RoleId) -> UserId {
        let hash = self.hasher.hash(PASSWORD).await.unwrap();
        let identity = Identity::new(
            username,
            Some(format!("{username}@estate.example")),
            hash,
            role_id,
            None,
        );
        let id = identity.id;
        self.store.insert_identity(identity);
        id
    }

    /// Log in over the web with [`PASSWORD`] and assert success
    pub async fn login(&self, username: &str) -> SessionResult {
        let result = self
            .engine
            .sessions()
            .login(fieldauth_auth::LoginRequest::new(username, PASSWORD).with_source("10.1.0.1"))
            .await
            .unwrap();
        assert!(result.success, "login failed: {:?}", result.failure_reason);
        result
    }

    /// Wait until the sink has seen an event of `event_type`
    pub async fn wait_for_event(&self, event_type: SecurityEventType) -> SecurityEvent {
        for _ in 0..100 {
            if let Some(event) = self
                .sink
                .events()
                .await
                .into_iter()
                .find(|e| e.event_type == event_type)
            {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no {event_type} event recorded");
    }
}
