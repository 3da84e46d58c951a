//! CLI command tests

mod common;

use chrono::{Duration, Utc};

use common::setup;
use compactlink::interfaces::cli::commands::{create_tenant, sweep_rate_limits};
use compactlink::storage::{RateLimitStore, TenantStore, Tier};

#[tokio::test]
async fn test_tenant_create_command() {
    let env = setup().await;

    let tenant = create_tenant(&env.storage, Tier::Basic, None).await.unwrap();
    assert_eq!(tenant.tier, Tier::Basic);
    assert!(tenant.access_token.starts_with("cl_"));

    let found = env
        .storage
        .find_by_token(&tenant.access_token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, tenant.id);
}

#[tokio::test]
async fn test_tenant_create_with_explicit_token() {
    let env = setup().await;

    let tenant = create_tenant(&env.storage, Tier::Free, Some("explicit-token-0001".to_string()))
        .await
        .unwrap();
    assert_eq!(tenant.access_token, "explicit-token-0001");

    // 太短的 token 会在入库前被拒绝
    assert!(create_tenant(&env.storage, Tier::Free, Some("short".to_string()))
        .await
        .is_err());
}

#[tokio::test]
async fn test_sweep_rate_limits_command() {
    let env = setup().await;
    let now = Utc::now();
    env.storage
        .record_hit("expired", now - Duration::seconds(120), now - Duration::seconds(60))
        .await
        .unwrap();
    env.storage
        .record_hit("live", now, now + Duration::seconds(60))
        .await
        .unwrap();

    assert_eq!(sweep_rate_limits(&env.storage).await.unwrap(), 1);
    assert_eq!(env.storage.window_entries("live").await.unwrap().count, 1);
}
