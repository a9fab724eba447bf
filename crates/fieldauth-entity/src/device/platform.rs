//! Client platform enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client platform a request originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    /// Browser client.
    Web,
    /// Android handset.
    Android,
    /// iOS handset.
    Ios,
}

impl Platform {
    /// Mobile platforms go through device binding.
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }

    /// Return the platform as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "WEB",
            Self::Android => "ANDROID",
            Self::Ios => "IOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = fieldauth_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WEB" => Ok(Self::Web),
            "ANDROID" => Ok(Self::Android),
            "IOS" => Ok(Self::Ios),
            _ => Err(fieldauth_core::AppError::validation(format!(
                "Invalid platform: '{s}'. Expected one of: WEB, ANDROID, IOS"
            ))),
        }
    }
}
