//! Security event model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{SecurityEventId, UserId};

/// The kind of security-relevant occurrence being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    /// Credentials verified and a token set was issued.
    LoginSuccess,
    /// A login attempt failed for any reason.
    LoginFailure,
    /// An attempt was rejected by the rate limiter.
    RateLimitExceeded,
    /// A device was bound on first use.
    DeviceBound,
    /// A registered device presented a different fingerprint.
    DeviceMismatch,
    /// A revoked device attempted to authenticate, or a device was revoked.
    DeviceRevoked,
    /// A new device was refused because the user holds too many live bindings.
    DeviceLimitExceeded,
    /// A refresh token was rotated.
    TokenRefresh,
    /// An already-rotated refresh token was presented again.
    RefreshReplay,
    /// A single lineage was ended by the user.
    Logout,
    /// All of a user's lineages were ended.
    LogoutAll,
    /// An authorization check was denied.
    AuthorizationDenied,
    /// A user changed their password.
    PasswordChange,
}

impl SecurityEventType {
    /// The severity an event of this type carries unless overridden.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::LoginSuccess
            | Self::DeviceBound
            | Self::TokenRefresh
            | Self::Logout
            | Self::LogoutAll
            | Self::PasswordChange => Severity::Info,
            Self::LoginFailure
            | Self::RateLimitExceeded
            | Self::DeviceRevoked
            | Self::DeviceLimitExceeded
            | Self::AuthorizationDenied => Severity::Warning,
            Self::DeviceMismatch => Severity::Error,
            Self::RefreshReplay => Severity::Critical,
        }
    }

    /// Return the type as a lowercase snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::DeviceBound => "device_bound",
            Self::DeviceMismatch => "device_mismatch",
            Self::DeviceRevoked => "device_revoked",
            Self::DeviceLimitExceeded => "device_limit_exceeded",
            Self::TokenRefresh => "token_refresh",
            Self::RefreshReplay => "refresh_replay",
            Self::Logout => "logout",
            Self::LogoutAll => "logout_all",
            Self::AuthorizationDenied => "authorization_denied",
            Self::PasswordChange => "password_change",
        }
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine event.
    Info,
    /// Suspicious but expected at low volume.
    Warning,
    /// Likely attack or misconfiguration.
    Error,
    /// Confirmed abuse such as token replay.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Result of the decision being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The operation was allowed.
    Success,
    /// The operation was rejected.
    Failure,
}

/// One recorded authentication or authorization decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Unique event ID.
    pub id: SecurityEventId,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event_type: SecurityEventType,
    /// How severe it is.
    pub severity: Severity,
    /// Whether the decision allowed the operation.
    pub outcome: Outcome,
    /// The resolved identity, when known.
    pub user_id: Option<UserId>,
    /// The identifier supplied by the client (username or email).
    pub identifier: Option<String>,
    /// Source network address.
    pub source_addr: Option<String>,
    /// Client device id.
    pub device_id: Option<String>,
    /// Free-form detail, usually an error kind code.
    pub details: Option<String>,
}

impl SecurityEvent {
    /// Create an event with the type's default severity.
    pub fn new(event_type: SecurityEventType, outcome: Outcome) -> Self {
        Self {
            id: SecurityEventId::new(),
            timestamp: Utc::now(),
            event_type,
            severity: event_type.default_severity(),
            outcome,
            user_id: None,
            identifier: None,
            source_addr: None,
            device_id: None,
            details: None,
        }
    }

    /// Attach the user id.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach the client-supplied identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Attach the source address, if any.
    pub fn with_source(mut self, source_addr: Option<&str>) -> Self {
        self.source_addr = source_addr.map(str::to_string);
        self
    }

    /// Attach the device id, if any.
    pub fn with_device(mut self, device_id: Option<&str>) -> Self {
        self.device_id = device_id.map(str::to_string);
        self
    }

    /// Attach free-form details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Override the default severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_is_elevated() {
        let event = SecurityEvent::new(SecurityEventType::DeviceMismatch, Outcome::Failure);
        assert!(event.severity > Severity::Warning);
    }

    #[test]
    fn test_serialized_type_is_snake_case() {
        let event = SecurityEvent::new(SecurityEventType::RateLimitExceeded, Outcome::Failure)
            .with_identifier("mandor1")
            .with_source(Some("10.0.0.7"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "rate_limit_exceeded");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["source_addr"], "10.0.0.7");
    }
}
