//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::storage::Tier;

/// compactlink - multi-tenant URL shortener
#[derive(Parser, Debug)]
#[command(name = "compactlink")]
#[command(version)]
#[command(about = "Multi-tenant URL shortener", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// 未指定子命令时启动服务器
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print a sample configuration file, or write it to a path
    GenerateConfig {
        /// Output path; prints to stdout when omitted
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        action: TenantCommands,
    },

    /// Purge expired rate limit records once
    SweepRateLimits,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TenantCommands {
    /// Provision a tenant and print its access token
    Create {
        /// Tier: free, basic, pro, enterprise
        #[arg(long, default_value = "free", value_parser = parse_tier)]
        tier: Tier,

        /// Use this access token instead of generating one
        #[arg(long)]
        token: Option<String>,
    },
}

fn parse_tier(value: &str) -> Result<Tier, String> {
    value
        .parse::<Tier>()
        .map_err(|_| format!("unknown tier '{}' (free, basic, pro, enterprise)", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["compactlink"]).unwrap();
        assert_eq!(cli.command_or_default(), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["compactlink", "serve", "-c", "/etc/cl.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/etc/cl.toml"));
    }

    #[test]
    fn test_tenant_create_tier() {
        let cli = Cli::try_parse_from(["compactlink", "tenant", "create", "--tier", "Pro"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Tenant {
                action: TenantCommands::Create {
                    tier: Tier::Pro,
                    token: None
                }
            })
        );

        let cli = Cli::try_parse_from(["compactlink", "tenant", "create"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Tenant {
                action: TenantCommands::Create {
                    tier: Tier::Free,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_unknown_tier_rejected() {
        assert!(Cli::try_parse_from(["compactlink", "tenant", "create", "--tier", "gold"]).is_err());
    }
}
