use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// 租户等级
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tier {
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// 访问设备类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// 已持久化的短链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub header: Option<String>,
    pub target: String,
    pub tenant_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub click_count: i64,
}

impl ShortLink {
    /// 对外路径：`{header}/{code}` 或 `{code}`
    pub fn path(&self) -> String {
        match &self.header {
            Some(header) => format!("{}/{}", header, self.code),
            None => self.code.clone(),
        }
    }
}

/// 待插入的短链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortLink {
    pub code: String,
    pub header: Option<String>,
    pub target: String,
    pub tenant_id: String,
    pub created_at: DateTime<Utc>,
}

/// 待追加的访问记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVisit {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub device_type: DeviceType,
    pub os: String,
    pub browser: String,
    pub referrer: String,
    pub location: String,
    pub visited_at: DateTime<Utc>,
}

/// 已持久化的访问记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub id: i64,
    pub link_id: i64,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub device_type: String,
    pub os: String,
    pub browser: String,
    pub referrer: String,
    pub location: String,
    pub visited_at: DateTime<Utc>,
}

/// 租户快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub tier: Tier,
    pub links_this_month: i64,
    pub link_limit_reset_date: DateTime<Utc>,
    pub api_calls_today: i64,
    pub api_call_reset_time: DateTime<Utc>,
    pub link_count: i64,
    pub created_at: DateTime<Utc>,
}

/// 租户计数器的部分更新，只携带发生变化的字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantUpdate {
    pub links_this_month: Option<i64>,
    pub link_limit_reset_date: Option<DateTime<Utc>>,
    pub api_calls_today: Option<i64>,
    pub api_call_reset_time: Option<DateTime<Utc>>,
}

impl TenantUpdate {
    pub fn is_empty(&self) -> bool {
        self.links_this_month.is_none()
            && self.link_limit_reset_date.is_none()
            && self.api_calls_today.is_none()
            && self.api_call_reset_time.is_none()
    }
}

/// 某个标识在当前窗口内的限流记录概况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub count: u64,
    /// 窗口内最早一条记录的过期时间
    pub oldest_expiry: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tier_parse_and_display() {
        assert_eq!(Tier::from_str("free").unwrap(), Tier::Free);
        assert_eq!(Tier::from_str("Enterprise").unwrap(), Tier::Enterprise);
        assert!(Tier::from_str("platinum").is_err());
        assert_eq!(Tier::Pro.to_string(), "pro");
    }

    #[test]
    fn test_link_path() {
        let mut link = ShortLink {
            id: 1,
            code: "abc1234".to_string(),
            header: None,
            target: "https://example.com".to_string(),
            tenant_id: "t1".to_string(),
            created_at: Utc::now(),
            click_count: 0,
        };
        assert_eq!(link.path(), "abc1234");
        link.header = Some("promo".to_string());
        assert_eq!(link.path(), "promo/abc1234");
    }

    #[test]
    fn test_tenant_update_is_empty() {
        assert!(TenantUpdate::default().is_empty());
        let update = TenantUpdate {
            api_calls_today: Some(0),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
