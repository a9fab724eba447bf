//! Password hashing commands.

use clap::{Args, Subcommand};
use dialoguer::Password;

use fieldauth_auth::credential::{CredentialHasher, PasswordPolicy};
use fieldauth_core::error::AppError;

use crate::output::{self, Field, OutputFormat};

/// Arguments for password commands
#[derive(Debug, Args)]
pub struct PasswordArgs {
    /// Password subcommand
    #[command(subcommand)]
    pub command: PasswordCommand,
}

/// Password subcommands
#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Hash a password with the configured Argon2id parameters
    Hash {
        /// Password to hash; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        /// Skip the password policy check
        #[arg(long)]
        skip_policy: bool,
    },
    /// Verify a password against a stored hash
    Verify {
        /// PHC-format hash
        hash: String,
        /// Password to check; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Check a password against the policy without hashing it
    Check {
        /// Password to check; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

fn read_password(given: &Option<String>, confirm: bool) -> Result<String, AppError> {
    if let Some(password) = given {
        return Ok(password.clone());
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt
        .interact()
        .map_err(|e| AppError::internal(format!("Failed to read password: {e}")))
}

/// Execute password commands
pub async fn execute(
    args: &PasswordArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;

    match &args.command {
        PasswordCommand::Hash {
            password,
            skip_policy,
        } => {
            let password = read_password(password, true)?;
            if !skip_policy {
                PasswordPolicy::new(&config.password).validate(&password)?;
            }
            let hasher = CredentialHasher::new(&config.hashing)?;
            let hash = hasher.hash(&password).await?;
            match format {
                OutputFormat::Table => println!("{hash}"),
                OutputFormat::Json => output::print_item(&serde_json::json!({ "hash": hash }), format),
            }
        }
        PasswordCommand::Verify { hash, password } => {
            let password = read_password(password, false)?;
            let hasher = CredentialHasher::new(&config.hashing)?;
            let matched = hasher.verify(&password, hash).await?;
            output::print_list(
                &[
                    Field::new("matches", matched),
                    Field::new("needs_rehash", hasher.needs_rehash(hash)),
                ],
                format,
            );
            if !matched {
                return Err(AppError::invalid_credentials());
            }
        }
        PasswordCommand::Check { password } => {
            let password = read_password(password, false)?;
            match PasswordPolicy::new(&config.password).validate(&password) {
                Ok(()) => output::print_success("Password satisfies the policy"),
                Err(e) => {
                    output::print_warning(&e.message);
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
