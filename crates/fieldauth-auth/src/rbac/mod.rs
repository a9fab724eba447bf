//! Effective permission resolution.
//!
//! Resolution for a user:
//! 1. Role baseline, restricted to an active role and active permissions.
//! 2. Plus non-expired grant overrides on active permissions.
//! 3. Minus non-expired deny overrides. Deny always wins.

pub mod effective;
pub mod resolver;
pub mod stats;

pub use effective::{CheckReason, EffectivePermissions, PermissionCheck};
pub use resolver::PermissionResolver;
