//! 静态配置校验
//!
//! 启动时检查配置取值是否自洽，发现问题直接拒绝启动。

use super::StaticConfig;

/// 校验整份配置，返回所有问题（空表示通过）
pub fn validate_static_config(config: &StaticConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if config.links.code_length == 0 {
        problems.push("links.code_length must be greater than 0".to_string());
    }
    if config.links.max_generation_attempts == 0 {
        problems.push("links.max_generation_attempts must be greater than 0".to_string());
    }
    if config.links.max_url_length == 0 {
        problems.push("links.max_url_length must be greater than 0".to_string());
    }
    if config.links.max_header_length == 0 {
        problems.push("links.max_header_length must be greater than 0".to_string());
    }
    if let Err(e) = validate_base_url(&config.links.base_url) {
        problems.push(e);
    }

    if config.rate_limit.window_secs == 0 {
        problems.push("rate_limit.window_secs must be greater than 0".to_string());
    }
    if config.rate_limit.max_requests == 0 {
        problems.push("rate_limit.max_requests must be greater than 0".to_string());
    }
    if config.rate_limit.cleanup_interval_secs == 0 {
        problems.push("rate_limit.cleanup_interval_secs must be greater than 0".to_string());
    }

    if config.quota.api_call_reset_secs == 0 {
        problems.push("quota.api_call_reset_secs must be greater than 0".to_string());
    }

    if config.api.max_body_bytes == 0 {
        problems.push("api.max_body_bytes must be greater than 0".to_string());
    }

    if config.database.operation_timeout_ms == 0 {
        problems.push("database.operation_timeout_ms must be greater than 0".to_string());
    }
    if config.database.retry_base_delay_ms > config.database.retry_max_delay_ms {
        problems.push(format!(
            "database.retry_base_delay_ms ({}) exceeds database.retry_max_delay_ms ({})",
            config.database.retry_base_delay_ms, config.database.retry_max_delay_ms
        ));
    }

    let invalid_proxies: Vec<&String> = config
        .server
        .trusted_proxies
        .iter()
        .filter(|p| !is_valid_proxy_entry(p))
        .collect();
    if !invalid_proxies.is_empty() {
        problems.push(format!(
            "server.trusted_proxies contains invalid entries: {:?}",
            invalid_proxies
        ));
    }

    if !matches!(config.logging.format.as_str(), "text" | "json") {
        problems.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        ));
    }

    problems
}

fn validate_base_url(base_url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| format!("links.base_url '{}' is not a valid URL: {}", base_url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "links.base_url must use http or https, got '{}'",
            other
        )),
    }
}

/// IP 或 CIDR（如 10.0.0.0/8）
fn is_valid_proxy_entry(entry: &str) -> bool {
    match entry.split_once('/') {
        Some((ip, prefix)) => {
            let Ok(ip) = ip.parse::<std::net::IpAddr>() else {
                return false;
            };
            let max = if ip.is_ipv4() { 32 } else { 128 };
            prefix.parse::<u8>().is_ok_and(|p| p <= max)
        }
        None => entry.parse::<std::net::IpAddr>().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_static_config(&StaticConfig::default()).is_empty());
    }

    #[test]
    fn test_zero_values_are_reported() {
        let mut config = StaticConfig::default();
        config.links.code_length = 0;
        config.rate_limit.max_requests = 0;
        let problems = validate_static_config(&config);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("links.code_length"));
        assert!(problems[1].contains("rate_limit.max_requests"));
    }

    #[test]
    fn test_base_url_scheme() {
        let mut config = StaticConfig::default();
        config.links.base_url = "ftp://example.com".to_string();
        let problems = validate_static_config(&config);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("http or https"));
    }

    #[test]
    fn test_trusted_proxy_entries() {
        assert!(is_valid_proxy_entry("10.0.0.1"));
        assert!(is_valid_proxy_entry("10.0.0.0/8"));
        assert!(is_valid_proxy_entry("::1/128"));
        assert!(!is_valid_proxy_entry("10.0.0.0/33"));
        assert!(!is_valid_proxy_entry("proxy.local"));
    }
}
