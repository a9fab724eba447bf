//! # fieldauth-auth
//!
//! The authentication and authorization engine.
//!
//! ## Modules
//!
//! - `credential`: Argon2id hashing, password policy, identifier + secret verification
//! - `device`: Device trust state and binding validation for mobile clients
//! - `jwt`: Claims, signing, and kind-aware decoding
//! - `token`: Token issuance, validation, single-use refresh rotation, revocation
//! - `rbac`: Effective permission resolution with time-bound overrides
//! - `ratelimit`: Fixed-window attempt limiting with lockout
//! - `audit`: Security event logging with pluggable sinks
//! - `session`: Session state machine and the orchestrating flows
//! - `maintenance`: Periodic purge of spent lineages, lapsed overrides, idle limiter windows

pub mod audit;
pub mod credential;
pub mod device;
pub mod jwt;
pub mod maintenance;
pub mod ratelimit;
pub mod rbac;
pub mod session;
pub mod token;

pub use audit::{MemorySink, SecurityLogger, SecuritySink};
pub use credential::{CredentialHasher, CredentialVerifier, PasswordPolicy};
pub use device::{DeviceBindingValidator, DeviceVerification, TrustState};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenKind};
pub use maintenance::{MaintenanceReport, MaintenanceTask};
pub use ratelimit::RateLimiter;
pub use rbac::{CheckReason, EffectivePermissions, PermissionCheck, PermissionResolver};
pub use session::{
    AuthorizationDecision, LoginRequest, SessionEvent, SessionOrchestrator, SessionResult,
    SessionState,
};
pub use token::{TokenService, TokenSet};

#[cfg(test)]
pub(crate) mod test_support;
