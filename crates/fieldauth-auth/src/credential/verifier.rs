//! Identifier + secret verification.

use std::sync::Arc;

use tracing::{debug, info, warn};

use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::identity::Identity;
use fieldauth_store::IdentityStore;

use super::hasher::CredentialHasher;
use super::policy::PasswordPolicy;

/// Verifies credentials against stored Argon2id hashes.
///
/// An unknown identifier, a deactivated identity, and a wrong secret all
/// produce the same `InvalidCredentials` error after one full Argon2
/// verification.
#[derive(Clone)]
pub struct CredentialVerifier {
    identities: Arc<dyn IdentityStore>,
    hasher: Arc<CredentialHasher>,
    policy: PasswordPolicy,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("policy", &self.policy)
            .finish()
    }
}

impl CredentialVerifier {
    /// Creates a new verifier.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        hasher: Arc<CredentialHasher>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            identities,
            hasher,
            policy,
        }
    }

    /// Verifies `secret` for the identity named by `identifier`.
    ///
    /// Store failures propagate as `StoreUnavailable` and are never
    /// reported as invalid credentials.
    pub async fn verify(&self, identifier: &str, secret: &str) -> AppResult<Identity> {
        let candidate = self
            .identities
            .find_by_identifier(identifier)
            .await?
            .filter(|identity| identity.is_active);

        let matched = match &candidate {
            Some(identity) => self.hasher.verify(secret, &identity.password_hash).await?,
            None => {
                self.hasher.verify(secret, self.hasher.dummy_hash()).await?;
                false
            }
        };

        match candidate {
            Some(identity) if matched => {
                self.rehash_if_needed(&identity, secret).await;
                Ok(identity)
            }
            _ => Err(AppError::invalid_credentials()),
        }
    }

    /// Replaces a hash produced with outdated parameters. Failures are
    /// logged and never affect the login.
    async fn rehash_if_needed(&self, identity: &Identity, secret: &str) {
        if !self.hasher.needs_rehash(&identity.password_hash) {
            return;
        }
        let result = async {
            let fresh = self.hasher.hash(secret).await?;
            self.identities
                .update_password_hash(identity.id, &fresh)
                .await
        }
        .await;
        match result {
            Ok(()) => debug!(user_id = %identity.id, "Password hash upgraded"),
            Err(e) => warn!(user_id = %identity.id, error = %e, "Password rehash failed"),
        }
    }

    /// Changes a user's secret after verifying the current one.
    ///
    /// The new secret must satisfy the password policy and differ from the
    /// current one. Revoking outstanding tokens is left to the caller.
    pub async fn change_secret(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> AppResult<()> {
        let identity = self
            .identities
            .find_by_id(user_id)
            .await?
            .filter(|identity| identity.is_active)
            .ok_or_else(AppError::invalid_credentials)?;

        if !self.hasher.verify(current, &identity.password_hash).await? {
            return Err(AppError::invalid_credentials());
        }

        self.policy.validate_not_same(current, new)?;
        self.policy.validate(new)?;

        let hash = self.hasher.hash(new).await?;
        self.identities.update_password_hash(user_id, &hash).await?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
