//! User-Agent 解析（woothee）

use woothee::parser::Parser;

use crate::storage::DeviceType;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub device_type: DeviceType,
    pub os: String,
    pub browser: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Desktop,
            os: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
        }
    }
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}

/// 解析设备类型、系统和浏览器；缺失或无法识别时为 Desktop / Unknown / Unknown
pub fn parse_user_agent(user_agent: Option<&str>) -> ClientInfo {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return ClientInfo::default();
    };

    let Some(result) = Parser::new().parse(ua) else {
        return ClientInfo::default();
    };

    // woothee 把安卓平板也归为 smartphone，按 UA 里是否有 Mobile 区分
    let is_tablet = result.os == "iPad"
        || (result.os == "Android" && !ua.contains("Mobile"))
        || ua.contains("Tablet");

    let device_type = if is_tablet {
        DeviceType::Tablet
    } else {
        match &*result.category {
            "smartphone" | "mobilephone" => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        }
    };

    ClientInfo {
        device_type,
        os: known(&result.os).unwrap_or_else(|| UNKNOWN.to_string()),
        browser: known(&result.name).unwrap_or_else(|| UNKNOWN.to_string()),
    }
}
