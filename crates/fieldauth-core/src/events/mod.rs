//! Events emitted by authentication and authorization decisions.
//!
//! Every decision the engine takes produces a [`SecurityEvent`], which is
//! handed to the security logger and fanned out to its sinks.

pub mod security;

pub use security::{Outcome, SecurityEvent, SecurityEventType, Severity};
