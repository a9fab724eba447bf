//! Device trust state, computed purely from the stored binding.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use fieldauth_entity::device::DeviceBinding;

/// Trust state of a (user, device id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustState {
    /// No binding exists yet.
    Unregistered,
    /// A live binding exists.
    Bound,
    /// The binding was revoked. Terminal.
    Revoked,
}

impl TrustState {
    /// Derive the state from the stored binding, if any.
    pub fn of(binding: Option<&DeviceBinding>) -> Self {
        match binding {
            None => Self::Unregistered,
            Some(b) if b.revoked => Self::Revoked,
            Some(_) => Self::Bound,
        }
    }
}

/// What to do with a presented fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Trust on first use: register the device.
    Register,
    /// Fingerprint matches a live binding.
    Accept,
    /// A live binding exists with a different fingerprint.
    RejectMismatch,
    /// The binding was revoked.
    RejectRevoked,
}

/// Decide how to treat `presented_hash` given the stored binding.
///
/// Revocation is checked before the fingerprint so a revoked device is
/// always reported as revoked.
pub fn decide(binding: Option<&DeviceBinding>, presented_hash: &str) -> TrustDecision {
    match (TrustState::of(binding), binding) {
        (TrustState::Unregistered, _) => TrustDecision::Register,
        (TrustState::Revoked, _) => TrustDecision::RejectRevoked,
        (TrustState::Bound, Some(b)) if fingerprints_match(&b.fingerprint_hash, presented_hash) => {
            TrustDecision::Accept
        }
        (TrustState::Bound, _) => TrustDecision::RejectMismatch,
    }
}

/// Hex SHA-256 digest of a raw fingerprint.
pub fn hash_fingerprint(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Constant-time comparison of two fingerprint digests.
pub fn fingerprints_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}
