//! # fieldauth
//!
//! Authentication and authorization engine for field operations clients.
//! [`AuthEngine`] wires the credential verifier, device binding, token
//! service, permission resolver, rate limiter and security logger around a
//! store, and exposes the session flows through its
//! [`SessionOrchestrator`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use fieldauth_auth::{
    CredentialHasher, CredentialVerifier, DeviceBindingValidator, MaintenanceTask,
    PasswordPolicy, PermissionResolver, RateLimiter, SecurityLogger, SecuritySink,
    SessionOrchestrator, TokenService,
};
use fieldauth_cache::provider::CacheManager;
use fieldauth_core::config::{AppConfig, LoggingConfig};
use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_store::{DeviceStore, IdentityStore, LineageStore, RbacStore};

/// A store implementing every port the engine consumes.
pub trait EngineStore: IdentityStore + RbacStore + DeviceStore + LineageStore {}

impl<T> EngineStore for T where T: IdentityStore + RbacStore + DeviceStore + LineageStore {}

/// The assembled engine.
#[derive(Clone)]
pub struct AuthEngine {
    config: Arc<AppConfig>,
    orchestrator: SessionOrchestrator,
    maintenance: MaintenanceTask,
}

impl std::fmt::Debug for AuthEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEngine")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl AuthEngine {
    /// Builds the engine with no security sinks beyond `tracing`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build<S: EngineStore>(config: AppConfig, store: Arc<S>) -> AppResult<Self> {
        Self::build_with_sinks(config, store, Vec::new())
    }

    /// Builds the engine, forwarding security events to `sinks`.
    pub fn build_with_sinks<S: EngineStore>(
        config: AppConfig,
        store: Arc<S>,
        sinks: Vec<Arc<dyn SecuritySink>>,
    ) -> AppResult<Self> {
        config.validate()?;
        tracing::info!("Initializing authentication engine");

        let cache = if config.rbac.cache_enabled {
            Some(CacheManager::new(&config.cache)?)
        } else {
            None
        };
        let logger = SecurityLogger::spawn(&config.security, sinks)?;

        let hasher = Arc::new(CredentialHasher::new(&config.hashing)?);
        let verifier = CredentialVerifier::new(
            store.clone(),
            hasher,
            PasswordPolicy::new(&config.password),
        );
        let devices = DeviceBindingValidator::new(&config.devices, store.clone());
        let tokens = TokenService::new(
            &config.tokens,
            store.clone(),
            store.clone(),
            devices.clone(),
            logger.clone(),
        );
        let permissions =
            PermissionResolver::new(&config.rbac, store.clone(), store.clone(), cache);
        let limiter = RateLimiter::new(&config.rate_limit);

        let maintenance =
            MaintenanceTask::new(tokens.clone(), permissions.clone(), limiter.clone());
        let orchestrator = SessionOrchestrator::new(
            verifier,
            devices,
            tokens,
            permissions,
            limiter,
            logger,
            store,
        );

        tracing::info!(
            issuer = %config.tokens.issuer,
            offline_tokens = config.tokens.offline_enabled,
            "Authentication engine ready"
        );

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            maintenance,
        })
    }

    /// The session flows: login, refresh, authorize, logout.
    pub fn sessions(&self) -> &SessionOrchestrator {
        &self.orchestrator
    }

    /// The housekeeping task.
    pub fn maintenance(&self) -> &MaintenanceTask {
        &self.maintenance
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Starts periodic housekeeping on a background task.
    pub fn spawn_maintenance(&self, interval: Duration) -> JoinHandle<()> {
        self.maintenance.clone().spawn(interval)
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
        _ => fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
    result.map_err(|e| AppError::configuration(format!("Failed to initialize logging: {e}")))
}
