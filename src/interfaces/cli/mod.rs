//! CLI interface module

pub mod commands;

use std::fmt;

use crate::cli::{Commands, TenantCommands};
use crate::config::StaticConfig;
use crate::errors::CompactError;
use crate::storage::StorageFactory;
use commands::{config_generate, create_tenant, sweep_rate_limits};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<CompactError> for CliError {
    fn from(err: CompactError) -> Self {
        CliError::StorageError(err.format_simple())
    }
}

/// Run a non-server CLI command
pub async fn run_cli_command(cmd: Commands, config: &StaticConfig) -> Result<(), CliError> {
    // generate-config 不需要数据库
    if let Commands::GenerateConfig { output_path, force } = cmd {
        return config_generate(output_path, force);
    }

    let storage = StorageFactory::create(&config.database).await?;

    let result = match cmd {
        Commands::Tenant {
            action: TenantCommands::Create { tier, token },
        } => create_tenant(&storage, tier, token).await.map(|_| ()),
        Commands::SweepRateLimits => sweep_rate_limits(&storage).await.map(|_| ()),
        Commands::Serve | Commands::GenerateConfig { .. } => Err(CliError::CommandError(
            "command is not handled by the CLI runner".to_string(),
        )),
    };

    (*storage).clone().close().await?;
    result
}
