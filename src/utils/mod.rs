pub mod ip;
pub mod url_validator;

pub use ip::extract_client_ip;
pub use url_validator::{UrlValidationError, sanitize_url, validate_and_sanitize};

/// 短码 / header 允许的字符
#[inline]
pub fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// 非空，且只含 `[A-Za-z0-9_-]`
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(is_path_char)
}

/// 1..=max_len 个 `[A-Za-z0-9_-]`
pub fn is_valid_header(header: &str, max_len: usize) -> bool {
    !header.is_empty() && header.len() <= max_len && header.chars().all(is_path_char)
}
