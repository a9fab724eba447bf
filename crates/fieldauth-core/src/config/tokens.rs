//! Token signing and lifetime configuration.

use serde::{Deserialize, Serialize};

/// Signing secrets, lifetimes, and validation leeway for the three token kinds.
///
/// Each kind has its own secret so that leaking one key family does not
/// compromise the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Value of the `iss` claim; validated on every decode.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// HMAC-SHA256 secret for access tokens.
    #[serde(default = "default_access_secret")]
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens.
    #[serde(default = "default_refresh_secret")]
    pub refresh_secret: String,
    /// HMAC-SHA256 secret for offline tokens.
    #[serde(default = "default_offline_secret")]
    pub offline_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Offline token TTL in hours.
    #[serde(default = "default_offline_ttl")]
    pub offline_ttl_hours: u64,
    /// Whether offline tokens are minted for device-bound logins.
    #[serde(default = "default_true")]
    pub offline_enabled: bool,
    /// How long after issuance an offline token is still accepted when the
    /// revocation store cannot be reached.
    #[serde(default = "default_offline_grace")]
    pub offline_grace_hours: u64,
    /// Clock skew tolerance in seconds applied to `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            access_secret: default_access_secret(),
            refresh_secret: default_refresh_secret(),
            offline_secret: default_offline_secret(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            offline_ttl_hours: default_offline_ttl(),
            offline_enabled: true,
            offline_grace_hours: default_offline_grace(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_issuer() -> String {
    "fieldauth".to_string()
}

fn default_access_secret() -> String {
    "CHANGE_ME_ACCESS_SECRET".to_string()
}

fn default_refresh_secret() -> String {
    "CHANGE_ME_REFRESH_SECRET".to_string()
}

fn default_offline_secret() -> String {
    "CHANGE_ME_OFFLINE_SECRET".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    168
}

fn default_offline_ttl() -> u64 {
    720
}

fn default_offline_grace() -> u64 {
    72
}

fn default_leeway() -> u64 {
    5
}

fn default_true() -> bool {
    true
}
