//! Shared fixtures: a throwaway SQLite database per test

#![allow(dead_code)]

use std::sync::{Arc, Once};

use tempfile::TempDir;

use compactlink::config::{StaticConfig, replace_config};
use compactlink::runtime::{AppServices, build_services};
use compactlink::storage::{SeaOrmStorage, StorageFactory, Tenant, Tier};

pub const BASE_URL: &str = "https://cmp.link";

static INIT: Once = Once::new();

/// 全局配置只初始化一次（IP 提取与错误响应会读取）
pub fn init_static_config() {
    INIT.call_once(|| {
        replace_config(StaticConfig::default());
    });
}

pub struct TestEnv {
    // 保持临时目录存活到测试结束
    pub dir: TempDir,
    pub config: StaticConfig,
    pub storage: Arc<SeaOrmStorage>,
    pub services: AppServices,
}

pub async fn setup() -> TestEnv {
    setup_with(|_| {}).await
}

pub async fn setup_with(tweak: impl FnOnce(&mut StaticConfig)) -> TestEnv {
    init_static_config();

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = StaticConfig::default();
    config.database.database_url = dir.path().join("compactlink.db").display().to_string();
    config.links.base_url = format!("{}/", BASE_URL);
    tweak(&mut config);

    let storage = StorageFactory::create(&config.database)
        .await
        .expect("Failed to create storage");
    let services = build_services(storage.clone(), &config);

    TestEnv {
        dir,
        config,
        storage,
        services,
    }
}

impl TestEnv {
    pub async fn tenant(&self, tier: Tier, token: &str) -> Tenant {
        self.storage
            .create_tenant(tier, Some(token.to_string()))
            .await
            .expect("Failed to create tenant")
    }
}
