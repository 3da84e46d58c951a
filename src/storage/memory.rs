//! 进程内限流存储
//!
//! 只在单实例部署下正确：多个实例各自计数，窗口不共享。
//! 用于本地开发和测试（`rate_limit.backend = "memory"`）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::models::WindowSnapshot;
use super::traits::RateLimitStore;
use crate::errors::Result;

#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    /// identifier -> 各条记录的过期时间
    entries: DashMap<String, Vec<DateTime<Utc>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前持有记录的标识数量
    pub fn tracked_identifiers(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn purge_expired(&self, identifier: &str, now: DateTime<Utc>) -> Result<()> {
        if let Some(mut expiries) = self.entries.get_mut(identifier) {
            expiries.retain(|expiry| *expiry > now);
        }
        self.entries
            .remove_if(identifier, |_, expiries| expiries.is_empty());
        Ok(())
    }

    async fn window_entries(&self, identifier: &str) -> Result<WindowSnapshot> {
        Ok(match self.entries.get(identifier) {
            Some(expiries) => WindowSnapshot {
                count: expiries.len() as u64,
                oldest_expiry: expiries.iter().min().copied(),
            },
            None => WindowSnapshot {
                count: 0,
                oldest_expiry: None,
            },
        })
    }

    async fn record_hit(
        &self,
        identifier: &str,
        _created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.entries
            .entry(identifier.to_string())
            .or_default()
            .push(expires_at);
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0u64;
        self.entries.retain(|_, expiries| {
            let before = expiries.len();
            expiries.retain(|expiry| *expiry > now);
            removed += (before - expiries.len()) as u64;
            !expiries.is_empty()
        });
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
