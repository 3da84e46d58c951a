use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{RateLimitBackend, StaticConfig};
use crate::services::{
    CodeGenerator, CreationService, CreationSettings, GeoIpProvider, QuotaManager, RateLimiter,
    ResolutionService, VisitRecorder,
};
use crate::storage::{MemoryRateLimitStore, RateLimitStore, SeaOrmStorage, StorageFactory};

/// 服务器运行所需的全部服务
#[derive(Clone)]
pub struct AppServices {
    pub storage: Arc<SeaOrmStorage>,
    pub creation: Arc<CreationService>,
    pub resolution: Arc<ResolutionService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cors_allowed_origins: Vec<String>,
}

/// 按配置组装各服务（存储已就绪）
pub fn build_services(storage: Arc<SeaOrmStorage>, config: &StaticConfig) -> AppServices {
    let timeout = Duration::from_millis(config.database.operation_timeout_ms);

    let rate_limit_store: Arc<dyn RateLimitStore> = match config.rate_limit.backend {
        RateLimitBackend::Database => storage.clone(),
        RateLimitBackend::Memory => Arc::new(MemoryRateLimitStore::new()),
    };
    let rate_limiter = Arc::new(RateLimiter::from_config(
        rate_limit_store,
        &config.rate_limit,
        timeout,
    ));

    let geoip = GeoIpProvider::new(&config.analytics);
    debug!("GeoIP provider: {}", geoip.provider_name());
    let recorder = Arc::new(VisitRecorder::new(storage.clone(), geoip, timeout));

    let resolution = Arc::new(ResolutionService::new(
        storage.clone(),
        recorder,
        timeout,
        config.links.max_header_length,
    ));

    let creation = Arc::new(CreationService::new(
        storage.clone(),
        storage.clone(),
        rate_limiter.clone(),
        QuotaManager::new(config.quota.api_call_reset_secs),
        CodeGenerator::new(
            config.links.code_length,
            config.links.max_generation_attempts,
        ),
        CreationSettings::from_config(config),
        timeout,
    ));

    AppServices {
        storage,
        creation,
        resolution,
        rate_limiter,
        cors_allowed_origins: config.api.cors_allowed_origins.clone(),
    }
}

/// 准备服务器启动的上下文：连接数据库、执行迁移、组装服务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<AppServices> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let services = build_services(storage, config);
    info!(
        "Rate limit: {} requests / {}s ({} backend)",
        services.rate_limiter.limit(),
        services.rate_limiter.window_secs(),
        services.rate_limiter.backend_name()
    );

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(services)
}
