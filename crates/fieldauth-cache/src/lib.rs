//! # fieldauth-cache
//!
//! Cache provider implementations for FieldAuth. The built-in provider is
//! an in-process cache using [moka](https://crates.io/crates/moka) with
//! per-entry expiry. The provider is selected at runtime based on
//! configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;

pub use provider::CacheManager;
