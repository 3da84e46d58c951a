use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use compactlink::cli::{Cli, Commands};
use compactlink::config::{get_config, init_config, validate_static_config};
use compactlink::interfaces::cli::run_cli_command;
use compactlink::runtime::run_server;
use compactlink::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config(cli.config.as_deref());
    let config = get_config();

    let command = cli.command_or_default();

    if command != Commands::Serve {
        if let Err(e) = run_cli_command(command, &config).await {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
        return Ok(());
    }

    // guard 需要活到进程结束，否则文件日志会丢
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    let problems = validate_static_config(&config);
    if !problems.is_empty() {
        for problem in &problems {
            error!("Invalid configuration: {}", problem);
        }
        anyhow::bail!("{} configuration problem(s), refusing to start", problems.len());
    }

    if let Err(e) = run_server().await {
        error!("Server exited with error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
