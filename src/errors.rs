use std::fmt;

use actix_web::http::StatusCode;

use crate::services::RateLimitStatus;

#[derive(Debug, Clone)]
pub enum CompactError {
    // 客户端输入
    InvalidUrl(String),
    InvalidHeader(String),
    InvalidFormat(String),
    MalformedBody(String),
    PayloadTooLarge(String),
    // 认证
    MissingCredentials(String),
    InvalidCredentials(String),
    // 限流 / 配额
    RateLimited(RateLimitStatus),
    QuotaExceeded(String),
    NotFound(String),
    // 服务端
    DuplicateCode(String),
    CodeGenerationExhausted(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    StoreTimeout(String),
    Serialization(String),
    FileOperation(String),
}

impl CompactError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            CompactError::InvalidUrl(_) => "E001",
            CompactError::InvalidHeader(_) => "E002",
            CompactError::InvalidFormat(_) => "E003",
            CompactError::MalformedBody(_) => "E004",
            CompactError::PayloadTooLarge(_) => "E005",
            CompactError::MissingCredentials(_) => "E006",
            CompactError::InvalidCredentials(_) => "E007",
            CompactError::RateLimited(_) => "E008",
            CompactError::QuotaExceeded(_) => "E009",
            CompactError::NotFound(_) => "E010",
            CompactError::DuplicateCode(_) => "E011",
            CompactError::CodeGenerationExhausted(_) => "E012",
            CompactError::DatabaseConfig(_) => "E013",
            CompactError::DatabaseConnection(_) => "E014",
            CompactError::DatabaseOperation(_) => "E015",
            CompactError::StoreTimeout(_) => "E016",
            CompactError::Serialization(_) => "E017",
            CompactError::FileOperation(_) => "E018",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            CompactError::InvalidUrl(_) => "Invalid URL",
            CompactError::InvalidHeader(_) => "Invalid Header",
            CompactError::InvalidFormat(_) => "Invalid Format",
            CompactError::MalformedBody(_) => "Malformed Body",
            CompactError::PayloadTooLarge(_) => "Payload Too Large",
            CompactError::MissingCredentials(_) => "Missing Credentials",
            CompactError::InvalidCredentials(_) => "Invalid Credentials",
            CompactError::RateLimited(_) => "Rate Limited",
            CompactError::QuotaExceeded(_) => "Quota Exceeded",
            CompactError::NotFound(_) => "Resource Not Found",
            CompactError::DuplicateCode(_) => "Duplicate Short Code",
            CompactError::CodeGenerationExhausted(_) => "Code Generation Exhausted",
            CompactError::DatabaseConfig(_) => "Database Configuration Error",
            CompactError::DatabaseConnection(_) => "Database Connection Error",
            CompactError::DatabaseOperation(_) => "Database Operation Error",
            CompactError::StoreTimeout(_) => "Store Timeout",
            CompactError::Serialization(_) => "Serialization Error",
            CompactError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        match self {
            CompactError::RateLimited(status) => format!(
                "Rate limit exceeded. Try again in {} seconds",
                status.retry_after_secs
            ),
            CompactError::InvalidUrl(msg)
            | CompactError::InvalidHeader(msg)
            | CompactError::InvalidFormat(msg)
            | CompactError::MalformedBody(msg)
            | CompactError::PayloadTooLarge(msg)
            | CompactError::MissingCredentials(msg)
            | CompactError::InvalidCredentials(msg)
            | CompactError::QuotaExceeded(msg)
            | CompactError::NotFound(msg)
            | CompactError::DuplicateCode(msg)
            | CompactError::CodeGenerationExhausted(msg)
            | CompactError::DatabaseConfig(msg)
            | CompactError::DatabaseConnection(msg)
            | CompactError::DatabaseOperation(msg)
            | CompactError::StoreTimeout(msg)
            | CompactError::Serialization(msg)
            | CompactError::FileOperation(msg) => msg.clone(),
        }
    }

    /// 映射 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            CompactError::InvalidUrl(_)
            | CompactError::InvalidHeader(_)
            | CompactError::InvalidFormat(_)
            | CompactError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            CompactError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            CompactError::MissingCredentials(_) => StatusCode::UNAUTHORIZED,
            CompactError::InvalidCredentials(_) | CompactError::QuotaExceeded(_) => {
                StatusCode::FORBIDDEN
            }
            CompactError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            CompactError::NotFound(_) => StatusCode::NOT_FOUND,
            CompactError::DuplicateCode(_)
            | CompactError::CodeGenerationExhausted(_)
            | CompactError::DatabaseConfig(_)
            | CompactError::DatabaseConnection(_)
            | CompactError::DatabaseOperation(_)
            | CompactError::StoreTimeout(_)
            | CompactError::Serialization(_)
            | CompactError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 服务端错误只在开发模式下把细节返回给调用方
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// 格式化为彩色输出（用于 CLI）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for CompactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CompactError {}

// 便捷的构造函数
impl CompactError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        CompactError::InvalidUrl(msg.into())
    }

    pub fn invalid_header<T: Into<String>>(msg: T) -> Self {
        CompactError::InvalidHeader(msg.into())
    }

    pub fn invalid_format<T: Into<String>>(msg: T) -> Self {
        CompactError::InvalidFormat(msg.into())
    }

    pub fn malformed_body<T: Into<String>>(msg: T) -> Self {
        CompactError::MalformedBody(msg.into())
    }

    pub fn payload_too_large<T: Into<String>>(msg: T) -> Self {
        CompactError::PayloadTooLarge(msg.into())
    }

    pub fn missing_credentials<T: Into<String>>(msg: T) -> Self {
        CompactError::MissingCredentials(msg.into())
    }

    pub fn invalid_credentials<T: Into<String>>(msg: T) -> Self {
        CompactError::InvalidCredentials(msg.into())
    }

    pub fn quota_exceeded<T: Into<String>>(msg: T) -> Self {
        CompactError::QuotaExceeded(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        CompactError::NotFound(msg.into())
    }

    pub fn duplicate_code<T: Into<String>>(msg: T) -> Self {
        CompactError::DuplicateCode(msg.into())
    }

    pub fn code_generation_exhausted<T: Into<String>>(msg: T) -> Self {
        CompactError::CodeGenerationExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        CompactError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        CompactError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        CompactError::DatabaseOperation(msg.into())
    }

    pub fn store_timeout<T: Into<String>>(msg: T) -> Self {
        CompactError::StoreTimeout(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        CompactError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        CompactError::FileOperation(msg.into())
    }
}

impl From<sea_orm::DbErr> for CompactError {
    fn from(err: sea_orm::DbErr) -> Self {
        CompactError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for CompactError {
    fn from(err: std::io::Error) -> Self {
        CompactError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CompactError {
    fn from(err: serde_json::Error) -> Self {
        CompactError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompactError>;
