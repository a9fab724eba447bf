//! JWT verification with kind separation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use fieldauth_core::config::TokenConfig;
use fieldauth_core::error::AppError;

use super::claims::{Claims, TokenKind};

/// The only claim read before the signature is checked.
#[derive(Deserialize)]
struct KindPeek {
    kind: TokenKind,
}

/// Verifies tokens against the key of the expected kind.
#[derive(Clone)]
pub struct JwtDecoder {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
    offline_key: DecodingKey,
    validation: Validation,
    kind_peek: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from token configuration.
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let mut kind_peek = Validation::new(Algorithm::HS256);
        kind_peek.insecure_disable_signature_validation();
        kind_peek.validate_exp = false;
        kind_peek.required_spec_claims.clear();

        Self {
            access_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            offline_key: DecodingKey::from_secret(config.offline_secret.as_bytes()),
            validation,
            kind_peek,
        }
    }

    fn key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_key,
            TokenKind::Refresh => &self.refresh_key,
            TokenKind::Offline => &self.offline_key,
        }
    }

    /// Decodes and verifies `token` as a token of kind `expected`.
    ///
    /// Checks, in order:
    /// 1. The unverified `kind` claim equals `expected` (else `WrongKind`)
    /// 2. Signature under the expected kind's key (else `Malformed`)
    /// 3. Issuer and expiry with leeway (`Malformed` / `Expired`)
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
        let peeked = decode::<KindPeek>(token, &DecodingKey::from_secret(&[]), &self.kind_peek)
            .map_err(|_| AppError::malformed("Token could not be parsed"))?;
        if peeked.claims.kind != expected {
            return Err(AppError::wrong_kind(format!(
                "Expected {expected} token, got {}",
                peeked.claims.kind
            )));
        }

        let token_data =
            decode::<Claims>(token, self.key(expected), &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::expired("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::malformed("Invalid token signature")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::malformed("Invalid token issuer")
                    }
                    _ => AppError::malformed(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}
