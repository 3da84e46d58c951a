//! Tenant provisioning

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::tier_limits;
use crate::storage::{SeaOrmStorage, Tenant, Tier};

fn describe_limit(limit: Option<i64>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |l| l.to_string())
}

/// Create a tenant and print its access token
pub async fn create_tenant(
    storage: &SeaOrmStorage,
    tier: Tier,
    token: Option<String>,
) -> Result<Tenant, CliError> {
    if let Some(token) = token.as_deref()
        && token.len() < crate::config::get_config().api.min_token_length
    {
        return Err(CliError::CommandError(format!(
            "Access token must be at least {} characters",
            crate::config::get_config().api.min_token_length
        )));
    }

    let tenant = storage.create_tenant(tier, token).await?;
    let limits = tier_limits(tenant.tier);

    println!("{}", "Tenant created".bold().green());
    println!("  {}:           {}", "ID".cyan(), tenant.id);
    println!("  {}:         {}", "Tier".cyan(), tenant.tier);
    println!(
        "  {}:  {}",
        "Links / month".cyan(),
        describe_limit(limits.link_limit)
    );
    println!(
        "  {}:    {}",
        "API calls".cyan(),
        describe_limit(limits.api_call_limit)
    );
    println!("  {}: {}", "Access token".cyan(), tenant.access_token.bold());

    Ok(tenant)
}
