//! `/compact`: short link creation and service metadata

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;

use super::response::{apply_rate_limit_headers, error_response, ok_json};
use crate::api::middleware::request_id_of;
use crate::errors::{CompactError, Result};
use crate::services::{CreatedLink, CreationService};

pub const ALLOWED_METHODS: &str = "GET, POST, HEAD, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept, X-Request-ID";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactResponse {
    pub short_url: String,
    pub short_code: String,
    pub long_url: String,
    pub header: Option<String>,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub request_id: String,
}

impl CompactResponse {
    fn new(created: &CreatedLink, request_id: String) -> Self {
        Self {
            short_url: created.short_url.clone(),
            short_code: created.link.code.clone(),
            long_url: created.link.target.clone(),
            header: created.link.header.clone(),
            click_count: created.link.click_count,
            created_at: created.link.created_at,
            request_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitInfo {
    window_secs: i64,
    max_requests: u32,
    backend: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    endpoints: Vec<&'static str>,
    code_length: usize,
    rate_limit: RateLimitInfo,
    request_id: String,
}

/// 读取请求体，超过 `limit` 字节立即停止
async fn read_limited(mut payload: web::Payload, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk
            .map_err(|e| CompactError::malformed_body(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(CompactError::payload_too_large(format!(
                "Request body exceeds {} bytes",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub struct CompactService;

impl CompactService {
    pub async fn create(
        req: HttpRequest,
        payload: web::Payload,
        service: web::Data<CreationService>,
    ) -> HttpResponse {
        let request_id = request_id_of(&req);

        let body = match read_limited(payload, service.settings().max_body_bytes).await {
            Ok(body) => body,
            Err(e) => return error_response(&e, &request_id),
        };

        let authorization = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match service.create(&body, authorization, &request_id).await {
            Ok(created) => {
                let mut builder = HttpResponse::build(StatusCode::OK);
                apply_rate_limit_headers(&mut builder, &created.rate_limit);
                builder.json(CompactResponse::new(&created, request_id))
            }
            Err(e) => error_response(&e, &request_id),
        }
    }

    pub async fn info(req: HttpRequest, service: web::Data<CreationService>) -> HttpResponse {
        let limiter = service.rate_limiter();
        ok_json(&ServiceInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            endpoints: vec![
                "POST /compact",
                "GET /compact",
                "GET /{code}",
                "GET /{header}/{code}",
            ],
            code_length: service.generator().length(),
            rate_limit: RateLimitInfo {
                window_secs: limiter.window_secs(),
                max_requests: limiter.limit(),
                backend: limiter.backend_name(),
            },
            request_id: request_id_of(&req),
        })
    }

    pub async fn head() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    /// 预检也由这里应答，CORS 中间件只补 Allow-Origin
    pub async fn options() -> HttpResponse {
        HttpResponse::NoContent()
            .insert_header(("Allow", ALLOWED_METHODS))
            .insert_header(("Access-Control-Allow-Methods", ALLOWED_METHODS))
            .insert_header(("Access-Control-Allow-Headers", ALLOWED_HEADERS))
            .insert_header(("Access-Control-Max-Age", "3600"))
            .finish()
    }
}

pub fn compact_routes() -> actix_web::Resource {
    web::resource("/compact")
        .route(web::post().to(CompactService::create))
        .route(web::get().to(CompactService::info))
        .route(web::head().to(CompactService::head))
        .route(web::method(actix_web::http::Method::OPTIONS).to(CompactService::options))
}
