//! CLI command definitions and dispatch.

pub mod config;
pub mod password;
pub mod token;

use clap::{Parser, Subcommand};

use fieldauth_core::config::AppConfig;
use fieldauth_core::error::AppError;

use crate::output::OutputFormat;

/// FieldAuth administration
#[derive(Debug, Parser)]
#[command(name = "fieldauth", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hash, verify, and score passwords
    Password(password::PasswordArgs),
    /// Inspect tokens
    Token(token::TokenArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Password(args) => password::execute(args, &self.config, self.format).await,
            Commands::Token(args) => token::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::from_file(config_path)
}
