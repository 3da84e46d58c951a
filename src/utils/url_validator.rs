//! URL 验证与清洗
//!
//! 阻止危险协议和回环地址，去掉常见的追踪参数

use url::{Host, Url};

/// URL 验证错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    TooLong(usize),
    InvalidProtocol(String),
    DangerousProtocol(String),
    LoopbackHost(String),
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::TooLong(max) => write!(f, "URL exceeds maximum length of {} characters", max),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::DangerousProtocol(proto) => {
                write!(f, "Dangerous protocol blocked: {}", proto)
            }
            Self::LoopbackHost(host) => write!(f, "Loopback host is not allowed: {}", host),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "ftp:",
    "vbscript:",
    "about:",
    "blob:",
];

/// 追踪参数（精确匹配，另外所有 `utm_` 前缀都会被去掉）
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid", "yclid", "_ga", "igshid",
];

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

fn is_loopback_host(host: Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => ip.is_loopback() || ip.is_unspecified(),
        Host::Ipv6(ip) => ip.is_loopback() || ip.is_unspecified(),
    }
}

/// 验证 URL 安全性
///
/// 检查项目：
/// 1. URL 不为空且不超过 `max_len`
/// 2. 不是危险协议（javascript:, data:, file:, ftp: 等）
/// 3. 必须是 http:// 或 https://
/// 4. URL 格式有效且主机不是回环地址
pub fn validate_url(url: &str, max_len: usize) -> Result<Url, UrlValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }
    if url.chars().count() > max_len {
        return Err(UrlValidationError::TooLong(max_len));
    }

    let url_lower = url.to_lowercase();

    for proto in DANGEROUS_PROTOCOLS {
        if url_lower.starts_with(proto) {
            return Err(UrlValidationError::DangerousProtocol(proto.to_string()));
        }
    }

    if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
        let proto = url_lower
            .split(':')
            .next()
            .map(|s| format!("{}:", s))
            .unwrap_or_default();
        return Err(UrlValidationError::InvalidProtocol(proto));
    }

    let parsed = Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match parsed.host() {
        None => return Err(UrlValidationError::InvalidFormat("missing host".to_string())),
        Some(host) if is_loopback_host(host.clone()) => {
            return Err(UrlValidationError::LoopbackHost(host.to_string()));
        }
        Some(_) => {}
    }

    Ok(parsed)
}

/// 去掉追踪参数；没有参数被去掉时查询串保持原样
///
/// 对结果再次调用得到相同字符串。
pub fn sanitize_url(url: &Url) -> String {
    let mut cleaned = url.clone();

    if url.query().is_some() {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let kept: Vec<&(String, String)> =
            pairs.iter().filter(|(k, _)| !is_tracking_param(k)).collect();

        if kept.len() != pairs.len() {
            if kept.is_empty() {
                cleaned.set_query(None);
            } else {
                cleaned.query_pairs_mut().clear().extend_pairs(kept);
            }
        }
    }

    cleaned.to_string()
}

/// 验证后清洗，返回存储用的目标地址
pub fn validate_and_sanitize(url: &str, max_len: usize) -> Result<String, UrlValidationError> {
    let parsed = validate_url(url, max_len)?;
    Ok(sanitize_url(&parsed))
}
