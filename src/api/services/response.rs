//! JSON 响应构造

use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;
use tracing::{error, info};

use crate::config::get_config;
use crate::errors::CompactError;
use crate::services::RateLimitStatus;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub request_id: String,
}

/// 把 X-RateLimit-* 头写入响应
pub fn apply_rate_limit_headers(builder: &mut HttpResponseBuilder, status: &RateLimitStatus) {
    let headers = [
        ("x-ratelimit-limit", status.limit.to_string()),
        ("x-ratelimit-remaining", status.remaining.to_string()),
        ("x-ratelimit-reset", status.reset_at.timestamp().to_string()),
    ];
    for (name, value) in headers {
        if let Ok(value) = HeaderValue::from_str(&value) {
            builder.insert_header((HeaderName::from_static(name), value));
        }
    }
}

/// 错误 → `{error, requestId}`
///
/// 5xx 只返回通用信息（`api.expose_error_details` 打开时除外），细节写日志。
pub fn error_response(err: &CompactError, request_id: &str) -> HttpResponse {
    let status = err.http_status();

    let message = if err.is_server_error() {
        error!(request_id, "{} [{}]: {}", err.error_type(), err.code(), err.message());
        if get_config().api.expose_error_details {
            err.message()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        }
    } else {
        info!(request_id, "Request rejected ({}): {}", status.as_u16(), err.message());
        err.message()
    };

    let mut builder = HttpResponse::build(status);
    if let CompactError::RateLimited(limit) = err {
        builder.insert_header(("Retry-After", limit.retry_after_secs.to_string()));
        apply_rate_limit_headers(&mut builder, limit);
    }

    builder.json(ErrorBody {
        error: message,
        request_id: request_id.to_string(),
    })
}

/// 200 JSON
pub fn ok_json<T: Serialize>(body: &T) -> HttpResponse {
    HttpResponse::build(StatusCode::OK).json(body)
}
