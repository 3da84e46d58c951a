//! 滑动窗口限流
//!
//! 每次检查：清理该标识已过期的记录 → 统计窗口内记录 → 超限拒绝，
//! 否则写入一条新记录放行。存储出错或超时一律放行（fail open）。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RateLimitConfig;
use crate::errors::Result;
use crate::storage::{RateLimitStore, WindowSnapshot, bounded};

/// 一次限流检查的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    /// 被拒绝时距离最早记录过期的秒数（至少 1）；放行时为 0
    pub retry_after_secs: u64,
    pub reset_at: DateTime<Utc>,
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    window: chrono::Duration,
    max_requests: u32,
    timeout: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn RateLimitStore>,
        window_secs: u64,
        max_requests: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            window: chrono::Duration::seconds(window_secs.max(1) as i64),
            max_requests: max_requests.max(1),
            timeout,
        }
    }

    pub fn from_config(
        store: Arc<dyn RateLimitStore>,
        config: &RateLimitConfig,
        timeout: Duration,
    ) -> Self {
        Self::new(store, config.window_secs, config.max_requests, timeout)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub fn window_secs(&self) -> i64 {
        self.window.num_seconds()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    pub async fn check_limit(&self, identifier: &str) -> RateLimitStatus {
        self.check_limit_at(identifier, Utc::now()).await
    }

    /// 以给定时间点执行一次检查（测试用来推进时间）
    pub async fn check_limit_at(&self, identifier: &str, now: DateTime<Utc>) -> RateLimitStatus {
        match self.try_check(identifier, now).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    "Rate limit store ({}) unavailable, allowing request: {}",
                    self.store.name(),
                    e
                );
                RateLimitStatus {
                    allowed: true,
                    remaining: self.max_requests - 1,
                    limit: self.max_requests,
                    retry_after_secs: 0,
                    reset_at: now + self.window,
                }
            }
        }
    }

    async fn try_check(&self, identifier: &str, now: DateTime<Utc>) -> Result<RateLimitStatus> {
        bounded(
            "rate_limit.purge_expired",
            self.timeout,
            self.store.purge_expired(identifier, now),
        )
        .await?;

        let WindowSnapshot {
            count,
            oldest_expiry,
        } = bounded(
            "rate_limit.window_entries",
            self.timeout,
            self.store.window_entries(identifier),
        )
        .await?;

        let reset_at = oldest_expiry.unwrap_or(now + self.window);

        if count >= self.max_requests as u64 {
            let retry_after_secs = seconds_until(now, reset_at).max(1);
            debug!(
                "Rate limit exceeded: {} requests in window, retry after {}s",
                count, retry_after_secs
            );
            return Ok(RateLimitStatus {
                allowed: false,
                remaining: 0,
                limit: self.max_requests,
                retry_after_secs,
                reset_at,
            });
        }

        bounded(
            "rate_limit.record_hit",
            self.timeout,
            self.store.record_hit(identifier, now, now + self.window),
        )
        .await?;

        Ok(RateLimitStatus {
            allowed: true,
            remaining: self.max_requests - count as u32 - 1,
            limit: self.max_requests,
            retry_after_secs: 0,
            reset_at,
        })
    }

    /// 清理所有过期记录
    pub async fn sweep(&self) -> Result<u64> {
        bounded(
            "rate_limit.sweep_expired",
            self.timeout,
            self.store.sweep_expired(Utc::now()),
        )
        .await
    }

    /// 后台定时清理任务
    pub fn spawn_cleanup_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 第一次 tick 立即返回，跳过
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match limiter.sweep().await {
                    Ok(0) => {}
                    Ok(removed) => info!("Swept {} expired rate limit records", removed),
                    Err(e) => warn!("Rate limit sweep failed: {}", e),
                }
            }
        })
    }
}

/// 向上取整的秒数
fn seconds_until(now: DateTime<Utc>, at: DateTime<Utc>) -> u64 {
    let millis = (at - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}
