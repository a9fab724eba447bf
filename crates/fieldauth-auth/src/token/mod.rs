//! Token lifecycle: issuance, validation, rotation, revocation.

pub mod service;

pub use service::{TokenService, TokenSet};
