//! GeoIP Provider 抽象层
//!
//! 统一的 GeoIP 查询接口，根据配置自动选择实现：
//! 1. 检查 maxminddb_path 是否配置且文件可读
//! 2. 可读 → MaxMindProvider
//! 3. 不可读 → NullGeoProvider（位置记为 Unknown）

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::maxmind::MaxMindProvider;
use crate::config::AnalyticsConfig;

pub const UNKNOWN_LOCATION: &str = "Unknown";

/// 地理位置信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    /// 国家名称（无英文名时为 ISO 3166-1 代码）
    pub country: Option<String>,
    /// 省 / 州
    pub region: Option<String>,
    /// 城市名称
    pub city: Option<String>,
}

impl GeoInfo {
    /// `City, Region, Country`，缺失的部分跳过；全部缺失时为 `Unknown`
    pub fn location(&self) -> String {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    /// 查询 IP 地址的地理位置
    async fn lookup(&self, ip: &str) -> Option<GeoInfo>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 不做任何查询的 provider
pub struct NullGeoProvider;

#[async_trait]
impl GeoIpLookup for NullGeoProvider {
    async fn lookup(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }

    fn name(&self) -> &'static str {
        "None"
    }
}

/// 统一 GeoIP Provider
///
/// 启动时根据配置自动选择实现
#[derive(Clone)]
pub struct GeoIpProvider {
    inner: Arc<dyn GeoIpLookup>,
}

impl GeoIpProvider {
    /// 根据 AnalyticsConfig 初始化
    pub fn new(config: &AnalyticsConfig) -> Self {
        let inner: Arc<dyn GeoIpLookup> = match config.maxminddb_path.as_deref() {
            Some(path) if !path.is_empty() => match MaxMindProvider::new(path) {
                Ok(provider) => {
                    info!("GeoIP: Using MaxMind database at {}", path);
                    Arc::new(provider)
                }
                Err(e) => {
                    warn!(
                        "GeoIP: Failed to load MaxMind database at {}: {}, locations will be recorded as Unknown",
                        path, e
                    );
                    Arc::new(NullGeoProvider)
                }
            },
            _ => {
                debug!("GeoIP: No MaxMind database configured");
                Arc::new(NullGeoProvider)
            }
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Self { inner }
    }

    /// 使用自定义实现（测试注入）
    pub fn with_lookup(inner: Arc<dyn GeoIpLookup>) -> Self {
        Self { inner }
    }

    /// 查询 IP 地址的地理位置
    pub async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        self.inner.lookup(ip).await
    }

    /// 直接得到位置字符串
    pub async fn location_of(&self, ip: &str) -> String {
        self.lookup(ip)
            .await
            .map(|info| info.location())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }

    /// 获取当前使用的 provider 名称
    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}
