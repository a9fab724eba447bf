//! # fieldauth-core
//!
//! Core crate for FieldAuth. Contains configuration schemas, typed
//! identifiers, security events, the cache port, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other FieldAuth crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
