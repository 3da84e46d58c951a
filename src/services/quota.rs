//! 租户配额
//!
//! 等级表是静态的。重置计划是纯函数：输入租户快照和当前时间，
//! 输出重置后的快照与需要持久化的字段，由调用方一次写入。

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::storage::{Tenant, TenantUpdate, Tier};

/// 某个等级的上限，`None` 表示不限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub link_limit: Option<i64>,
    pub api_call_limit: Option<i64>,
}

pub fn tier_limits(tier: Tier) -> TierLimits {
    match tier {
        Tier::Free => TierLimits {
            link_limit: Some(500),
            api_call_limit: Some(100),
        },
        Tier::Basic => TierLimits {
            link_limit: Some(5_000),
            api_call_limit: Some(1_000),
        },
        Tier::Pro => TierLimits {
            link_limit: Some(50_000),
            api_call_limit: Some(10_000),
        },
        Tier::Enterprise => TierLimits {
            link_limit: None,
            api_call_limit: None,
        },
    }
}

/// 重置计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaReset {
    pub tenant: Tenant,
    pub update: TenantUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl QuotaDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// `now` 之后那个月的 1 号 00:00 UTC
pub fn first_of_next_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now + Duration::days(31))
}

#[derive(Debug, Clone)]
pub struct QuotaManager {
    api_call_reset_period: Duration,
}

impl QuotaManager {
    pub fn new(api_call_reset_secs: u64) -> Self {
        Self {
            api_call_reset_period: Duration::seconds(api_call_reset_secs.max(1) as i64),
        }
    }

    pub fn api_call_reset_period(&self) -> Duration {
        self.api_call_reset_period
    }

    /// 计算到期的计数器重置
    pub fn plan_reset(&self, tenant: &Tenant, now: DateTime<Utc>) -> QuotaReset {
        let mut next = tenant.clone();
        let mut update = TenantUpdate::default();

        if now >= tenant.link_limit_reset_date {
            next.links_this_month = 0;
            next.link_limit_reset_date = first_of_next_month(now);
            update.links_this_month = Some(0);
            update.link_limit_reset_date = Some(next.link_limit_reset_date);
        }

        if now - tenant.api_call_reset_time >= self.api_call_reset_period {
            next.api_calls_today = 0;
            next.api_call_reset_time = now;
            update.api_calls_today = Some(0);
            update.api_call_reset_time = Some(now);
        }

        QuotaReset {
            tenant: next,
            update,
        }
    }

    /// 任一计数器达到上限即拒绝
    pub fn check_limits(&self, tenant: &Tenant) -> QuotaDecision {
        let limits = tier_limits(tenant.tier);

        if let Some(limit) = limits.link_limit
            && tenant.links_this_month >= limit
        {
            return QuotaDecision::deny(format!(
                "Monthly link limit reached ({}/{}) for {} tier",
                tenant.links_this_month, limit, tenant.tier
            ));
        }

        if let Some(limit) = limits.api_call_limit
            && tenant.api_calls_today >= limit
        {
            return QuotaDecision::deny(format!(
                "API call limit reached ({}/{}) for {} tier",
                tenant.api_calls_today, limit, tenant.tier
            ));
        }

        QuotaDecision::allow()
    }
}
