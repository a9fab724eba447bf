//! Unified error types for FieldAuth.
//!
//! Every component maps its failures into [`AppError`]. The authentication
//! and authorization outcomes that callers branch on are first-class
//! [`ErrorKind`] variants, so a dispatch layer can match on `err.kind`
//! without parsing messages.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Identifier or secret did not verify. Never says which.
    InvalidCredentials,
    /// A registered device presented a different fingerprint.
    DeviceMismatch,
    /// The device binding was revoked by an administrator.
    DeviceRevoked,
    /// The user already holds the maximum number of live device bindings.
    DeviceLimitExceeded,
    /// Too many attempts for this key within the current window.
    RateLimited,
    /// The token is past its expiry (beyond the configured leeway).
    Expired,
    /// The token could not be parsed or its signature did not verify.
    Malformed,
    /// The token is of a different kind than the one expected.
    WrongKind,
    /// The token's lineage was revoked, or a refresh token was already rotated.
    Revoked,
    /// The caller lacks the required permission.
    PermissionDenied,
    /// A store collaborator failed; distinct from any authentication failure.
    StoreUnavailable,
    /// Input validation failed (e.g., password policy).
    Validation,
    /// The requested record does not exist.
    NotFound,
    /// A conflicting record already exists.
    Conflict,
    /// A configuration error occurred.
    Configuration,
    /// A cache error occurred.
    Cache,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Returns `true` for outcomes of a genuine authentication or
    /// authorization decision, as opposed to infrastructure failures.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::DeviceMismatch
                | Self::DeviceRevoked
                | Self::DeviceLimitExceeded
                | Self::RateLimited
                | Self::Expired
                | Self::Malformed
                | Self::WrongKind
                | Self::Revoked
                | Self::PermissionDenied
        )
    }

    /// Return the kind as a stable upper-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DeviceMismatch => "DEVICE_MISMATCH",
            Self::DeviceRevoked => "DEVICE_REVOKED",
            Self::DeviceLimitExceeded => "DEVICE_LIMIT_EXCEEDED",
            Self::RateLimited => "RATE_LIMITED",
            Self::Expired => "EXPIRED",
            Self::Malformed => "MALFORMED",
            Self::WrongKind => "WRONG_KIND",
            Self::Revoked => "REVOKED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Configuration => "CONFIGURATION",
            Self::Cache => "CACHE",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout FieldAuth.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Constant-shape credential failure. The message is identical for an
    /// unknown identifier, a deactivated identity, and a wrong secret.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid identifier or secret")
    }

    /// Create a device-mismatch error.
    pub fn device_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeviceMismatch, message)
    }

    /// Create a device-revoked error.
    pub fn device_revoked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeviceRevoked, message)
    }

    /// Create a device-limit error.
    pub fn device_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeviceLimitExceeded, message)
    }

    /// Create a rate-limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Create a token-expired error.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create a malformed-token error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    /// Create a wrong-token-kind error.
    pub fn wrong_kind(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WrongKind, message)
    }

    /// Create a revoked error.
    pub fn revoked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Revoked, message)
    }

    /// Permission denial. Carries no detail about the capability set.
    pub fn permission_denied() -> Self {
        Self::new(ErrorKind::PermissionDenied, "Permission denied")
    }

    /// Create a store-unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` if this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_code() {
        let err = AppError::revoked("Lineage has been revoked");
        assert_eq!(err.to_string(), "REVOKED: Lineage has been revoked");
    }

    #[test]
    fn test_store_unavailable_is_not_an_auth_failure() {
        assert!(!ErrorKind::StoreUnavailable.is_auth_failure());
        assert!(ErrorKind::InvalidCredentials.is_auth_failure());
        assert!(ErrorKind::DeviceRevoked.is_auth_failure());
    }

    #[test]
    fn test_permission_denied_message_is_generic() {
        let err = AppError::permission_denied();
        assert_eq!(err.message, "Permission denied");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::with_source(ErrorKind::Internal, "wrapped", io);
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Internal);
        assert!(cloned.source.is_none());
    }
}
