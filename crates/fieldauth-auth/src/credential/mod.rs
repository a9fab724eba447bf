//! Credential hashing, policy, and verification.

pub mod hasher;
pub mod policy;
pub mod verifier;

pub use hasher::CredentialHasher;
pub use policy::PasswordPolicy;
pub use verifier::CredentialVerifier;
