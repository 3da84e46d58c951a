//! GeoIP 服务模块
//!
//! IP 地址地理位置查询：
//! - MaxMind GeoLite2 本地数据库
//! - 未配置或加载失败时统一返回 Unknown

mod maxmind;
mod provider;

pub use maxmind::MaxMindProvider;
pub use provider::{GeoInfo, GeoIpLookup, GeoIpProvider, NullGeoProvider, UNKNOWN_LOCATION};
