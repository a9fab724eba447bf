//! Engine configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a serde default so a partial file is valid.

pub mod cache;
pub mod device;
pub mod logging;
pub mod password;
pub mod rate_limit;
pub mod security;
pub mod tokens;

use serde::{Deserialize, Serialize};

pub use self::cache::{CacheConfig, MemoryCacheConfig};
pub use self::device::DeviceConfig;
pub use self::logging::LoggingConfig;
pub use self::password::{HashingConfig, PasswordConfig};
pub use self::rate_limit::RateLimitConfig;
pub use self::security::{RbacConfig, SecurityLogConfig};
pub use self::tokens::TokenConfig;

use crate::error::AppError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Token signing and lifetimes.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Password policy.
    #[serde(default)]
    pub password: PasswordConfig,
    /// Argon2id parameters and hashing concurrency.
    #[serde(default)]
    pub hashing: HashingConfig,
    /// Device binding limits.
    #[serde(default)]
    pub devices: DeviceConfig,
    /// Login and sensitive-operation throttling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Effective-permission caching.
    #[serde(default)]
    pub rbac: RbacConfig,
    /// Security audit log.
    #[serde(default)]
    pub security: SecurityLogConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment.
    ///
    /// Merges `config/default`, an environment overlay `config/{env}`, and
    /// environment variables prefixed with `FIELDAUTH__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FIELDAUTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from a single file plus the environment overlay.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("FIELDAUTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations that would weaken token separation or make
    /// the limiter and hasher unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        let t = &self.tokens;
        if t.access_secret.is_empty() || t.refresh_secret.is_empty() || t.offline_secret.is_empty()
        {
            return Err(AppError::configuration("Token secrets must not be empty"));
        }
        if t.access_secret == t.refresh_secret
            || t.access_secret == t.offline_secret
            || t.refresh_secret == t.offline_secret
        {
            return Err(AppError::configuration(
                "Access, refresh and offline tokens must use distinct secrets",
            ));
        }
        if t.access_ttl_minutes == 0 || t.refresh_ttl_hours == 0 {
            return Err(AppError::configuration("Token lifetimes must be positive"));
        }
        if self.rate_limit.login_max_attempts == 0 || self.rate_limit.operation_max_attempts == 0 {
            return Err(AppError::configuration("Rate limits must allow at least one attempt"));
        }
        if self.devices.max_devices_per_user == 0 {
            return Err(AppError::configuration(
                "devices.max_devices_per_user must be at least 1",
            ));
        }
        if self.hashing.max_concurrent == 0 {
            return Err(AppError::configuration(
                "hashing.max_concurrent must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.login_max_attempts, 5);
        assert_eq!(config.tokens.leeway_seconds, 5);
        assert_eq!(config.devices.max_devices_per_user, 5);
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = AppConfig::default();
        config.tokens.refresh_secret = config.tokens.access_secret.clone();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_device_limit_rejected() {
        let mut config = AppConfig::default();
        config.devices.max_devices_per_user = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let raw = r#"
            [tokens]
            issuer = "estate-ops"
            access_ttl_minutes = 5
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.tokens.issuer, "estate-ops");
        assert_eq!(config.tokens.access_ttl_minutes, 5);
        assert_eq!(config.tokens.refresh_ttl_hours, 168);
        assert_eq!(config.hashing.memory_kib, 65536);
    }
}
