//! 存储层接口
//!
//! 服务层只依赖这些 trait；`SeaOrmStorage` 实现全部接口，
//! 限流还有一个进程内实现 `MemoryRateLimitStore`。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{NewShortLink, NewVisit, ShortLink, Tenant, TenantUpdate, WindowSnapshot};
use crate::errors::Result;

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 插入新链接；`(code, header)` 已存在时返回 `DuplicateCode`
    async fn insert_link(&self, link: NewShortLink) -> Result<ShortLink>;

    async fn find_link(&self, code: &str, header: Option<&str>) -> Result<Option<ShortLink>>;

    async fn link_exists(&self, code: &str, header: Option<&str>) -> Result<bool>;

    /// 点击数 +1（单条 UPDATE，不与访问记录同事务）
    async fn increment_click(&self, link_id: i64) -> Result<()>;
}

#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn insert_visit(&self, link_id: i64, visit: NewVisit) -> Result<()>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<Tenant>>;

    /// 一次写入配额重置结果
    async fn apply_update(&self, tenant_id: &str, update: &TenantUpdate) -> Result<()>;

    /// 创建链接后 apiCallsToday / linksThisMonth / linkCount 各 +1
    async fn record_link_created(&self, tenant_id: &str) -> Result<()>;
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// 删除该标识下 `expires_at <= now` 的记录
    async fn purge_expired(&self, identifier: &str, now: DateTime<Utc>) -> Result<()>;

    async fn window_entries(&self, identifier: &str) -> Result<WindowSnapshot>;

    async fn record_hit(
        &self,
        identifier: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// 删除所有标识下已过期的记录，返回删除条数
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    fn name(&self) -> &'static str;
}
