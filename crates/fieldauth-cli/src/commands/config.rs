//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use fieldauth_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration with secrets masked
    Show,
    /// Validate configuration file
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            for secret in [
                &mut config.tokens.access_secret,
                &mut config.tokens.refresh_secret,
                &mut config.tokens.offline_secret,
            ] {
                *secret = mask_secret(secret);
            }
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Issuer", &config.tokens.issuer);
                output::print_kv(
                    "Access TTL",
                    &format!("{} min", config.tokens.access_ttl_minutes),
                );
                output::print_kv(
                    "Login limit",
                    &format!(
                        "{} per {}s",
                        config.rate_limit.login_max_attempts, config.rate_limit.login_window_seconds
                    ),
                );
                output::print_kv(
                    "Device limit",
                    &config.devices.max_devices_per_user.to_string(),
                );
                output::print_kv("Cache", &config.cache.provider);
                if [
                    &config.tokens.access_secret,
                    &config.tokens.refresh_secret,
                    &config.tokens.offline_secret,
                ]
                .iter()
                .any(|s| s.starts_with("CHANGE_ME"))
                {
                    output::print_warning("Default signing secrets are in use");
                }
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create dir: {e}")))?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::internal(format!("Failed to write config: {e}")))?;

            output::print_success(&format!("Default config written to '{out_path}'"));
        }
    }

    Ok(())
}

/// Keep the first four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}
