//! Argon2id password hashing and verification on the blocking pool.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tokio::sync::Semaphore;
use tracing::warn;

use fieldauth_core::config::HashingConfig;
use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;

/// Plaintext hashed at construction to produce the dummy hash used for
/// unknown identifiers.
const DUMMY_SECRET: &str = "fieldauth-dummy-secret";

/// Hashes and verifies secrets with Argon2id.
///
/// All hashing work runs on the blocking thread pool behind a semaphore,
/// so a login burst occupies at most `max_concurrent` blocking threads.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    permits: Arc<Semaphore>,
    dummy_hash: Arc<str>,
}

impl CredentialHasher {
    /// Creates a hasher from hashing configuration.
    ///
    /// Computes the dummy hash up front on the calling thread, so every
    /// unknown-identifier login later costs exactly one verification.
    pub fn new(config: &HashingConfig) -> AppResult<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            Some(config.output_len),
        )
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        let dummy_hash = Self::hash_blocking(params.clone(), DUMMY_SECRET)?;

        Ok(Self {
            params,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            dummy_hash: dummy_hash.into(),
        })
    }

    fn hash_blocking(params: Params, secret: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Self::argon2(params)
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    /// Hashes a plaintext secret with a random salt, producing a PHC string.
    pub async fn hash(&self, secret: &str) -> AppResult<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::internal("Hashing pool is closed"))?;
        let params = self.params.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || Self::hash_blocking(params, &secret))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
    }

    /// Verifies a plaintext secret against a stored PHC hash.
    ///
    /// Returns `Ok(false)` on mismatch. A hash that cannot be parsed is
    /// logged and treated as a mismatch so the caller's response keeps
    /// the same shape.
    pub async fn verify(&self, secret: &str, hash: &str) -> AppResult<bool> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::internal("Hashing pool is closed"))?;
        let secret = secret.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&hash) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "Stored password hash is not a valid PHC string");
                    return Ok(false);
                }
            };
            match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AppError::internal(format!(
                    "Password verification failed: {e}"
                ))),
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))?
    }

    /// A hash of a fixed secret computed with the configured parameters.
    ///
    /// Verifying against it costs the same as verifying a real hash.
    pub fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    /// Whether a stored hash was produced with different parameters than
    /// the configured ones and should be replaced.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        if parsed.version != Some(Version::V0x13.into()) {
            return true;
        }
        let Ok(stored) = Params::try_from(&parsed) else {
            return true;
        };
        stored.m_cost() != self.params.m_cost()
            || stored.t_cost() != self.params.t_cost()
            || stored.p_cost() != self.params.p_cost()
            || stored.output_len() != self.params.output_len()
    }
}
