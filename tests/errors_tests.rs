//! Error enum and HTTP error body tests

mod common;

use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use chrono::Utc;
use serde_json::Value;

use compactlink::api::services::error_response;
use compactlink::errors::CompactError;
use compactlink::services::RateLimitStatus;

fn limited(retry_after_secs: u64) -> CompactError {
    CompactError::RateLimited(RateLimitStatus {
        allowed: false,
        remaining: 0,
        limit: 100,
        retry_after_secs,
        reset_at: Utc::now(),
    })
}

#[test]
fn test_status_mapping() {
    let cases = [
        (CompactError::invalid_url("x"), StatusCode::BAD_REQUEST),
        (CompactError::invalid_header("x"), StatusCode::BAD_REQUEST),
        (CompactError::invalid_format("x"), StatusCode::BAD_REQUEST),
        (CompactError::malformed_body("x"), StatusCode::BAD_REQUEST),
        (CompactError::payload_too_large("x"), StatusCode::PAYLOAD_TOO_LARGE),
        (CompactError::missing_credentials("x"), StatusCode::UNAUTHORIZED),
        (CompactError::invalid_credentials("x"), StatusCode::FORBIDDEN),
        (CompactError::quota_exceeded("x"), StatusCode::FORBIDDEN),
        (limited(3), StatusCode::TOO_MANY_REQUESTS),
        (CompactError::not_found("x"), StatusCode::NOT_FOUND),
        (
            CompactError::code_generation_exhausted("x"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            CompactError::store_timeout("x"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            CompactError::database_operation("x"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(err.http_status(), status, "{:?}", err);
        assert_eq!(err.is_server_error(), status.is_server_error());
    }
}

#[test]
fn test_codes_are_unique() {
    let errors = [
        CompactError::invalid_url(""),
        CompactError::invalid_header(""),
        CompactError::invalid_format(""),
        CompactError::malformed_body(""),
        CompactError::payload_too_large(""),
        CompactError::missing_credentials(""),
        CompactError::invalid_credentials(""),
        limited(1),
        CompactError::quota_exceeded(""),
        CompactError::not_found(""),
        CompactError::duplicate_code(""),
        CompactError::code_generation_exhausted(""),
        CompactError::database_config(""),
        CompactError::database_connection(""),
        CompactError::database_operation(""),
        CompactError::store_timeout(""),
        CompactError::serialization(""),
        CompactError::file_operation(""),
    ];
    let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
    assert!(codes.iter().all(|c| c.starts_with('E')));
}

#[test]
fn test_display_and_conversions() {
    let err = CompactError::not_found("URL not found");
    assert_eq!(err.to_string(), "Resource Not Found: URL not found");
    assert!(err.format_colored().contains("E010"));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
    assert!(matches!(CompactError::from(io), CompactError::FileOperation(_)));

    let json = serde_json::from_str::<Value>("{").unwrap_err();
    assert!(matches!(CompactError::from(json), CompactError::Serialization(_)));

    let db = sea_orm::DbErr::Custom("boom".to_string());
    assert!(matches!(CompactError::from(db), CompactError::DatabaseOperation(_)));

    assert_eq!(
        limited(7).message(),
        "Rate limit exceeded. Try again in 7 seconds"
    );
}

#[actix_web::test]
async fn test_client_error_body_carries_message() {
    common::init_static_config();

    let resp = error_response(&CompactError::not_found("URL not found"), "req-123");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(resp.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "URL not found");
    assert_eq!(body["requestId"], "req-123");
}

#[actix_web::test]
async fn test_server_error_body_is_generic() {
    common::init_static_config();

    let resp = error_response(
        &CompactError::database_operation("SELECT failed: secret detail"),
        "req-500",
    );
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(resp.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Internal server error");
    assert!(!bytes.windows(6).any(|w| w == b"secret"));
}

#[actix_web::test]
async fn test_rate_limited_response_headers() {
    common::init_static_config();

    let resp = error_response(&limited(12), "req-429");
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers().get("retry-after").unwrap(), "12");
    assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "100");
    assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), "0");
    assert!(resp.headers().contains_key("x-ratelimit-reset"));
}
