//! Device binding for mobile clients.

pub mod trust;
pub mod validator;

pub use trust::{TrustDecision, TrustState, decide, fingerprints_match, hash_fingerprint};
pub use validator::{DeviceBindingValidator, DeviceVerification};
