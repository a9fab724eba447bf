//! Token inspection commands.

use clap::{Args, Subcommand, ValueEnum};

use fieldauth_auth::jwt::{JwtDecoder, TokenKind};
use fieldauth_core::error::AppError;

use crate::output::{self, Field, OutputFormat};

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token kind selector
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
    /// Offline token
    Offline,
}

impl From<KindArg> for TokenKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Access => TokenKind::Access,
            KindArg::Refresh => TokenKind::Refresh,
            KindArg::Offline => TokenKind::Offline,
        }
    }
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Verify a token's signature, kind, and expiry and print its claims.
    ///
    /// Lineage revocation is not checked; that needs the store.
    Decode {
        /// Expected token kind
        #[arg(short, long, value_enum, default_value = "access")]
        kind: KindArg,
        /// The encoded token
        token: String,
    },
}

/// Execute token commands
pub async fn execute(
    args: &TokenArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;

    match &args.command {
        TokenCommand::Decode { kind, token } => {
            let decoder = JwtDecoder::new(&config.tokens);
            let claims = decoder.decode(token, (*kind).into())?;
            output::print_list(
                &[
                    Field::new("kind", claims.kind),
                    Field::new("subject", claims.sub),
                    Field::new("lineage", claims.lid),
                    Field::new("role", claims.role),
                    Field::new("device", claims.did.as_deref().unwrap_or("-")),
                    Field::new("issued_at", claims.issued_at().to_rfc3339()),
                    Field::new("expires_at", claims.expires_at().to_rfc3339()),
                    Field::new("remaining_seconds", claims.remaining_ttl_seconds()),
                    Field::new("jti", claims.jti),
                ],
                format,
            );
        }
    }

    Ok(())
}
