//! One-shot rate limit sweep

use chrono::Utc;
use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::storage::{RateLimitStore, SeaOrmStorage};

pub async fn sweep_rate_limits(storage: &SeaOrmStorage) -> Result<u64, CliError> {
    let removed = storage.sweep_expired(Utc::now()).await?;
    println!(
        "{} {} expired rate limit records removed",
        "✓".bold().green(),
        removed
    );
    Ok(removed)
}
