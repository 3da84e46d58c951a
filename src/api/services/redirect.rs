//! Short link resolution: `GET /{code}` and `GET /{header}/{code}`

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::trace;

use super::response::{error_response, ok_json};
use crate::api::middleware::request_id_of;
use crate::services::{RequestMeta, ResolutionService};
use crate::utils::ip::extract_client_ip;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub long_url: String,
}

fn request_meta(req: &HttpRequest) -> RequestMeta {
    let header = |name: actix_web::http::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    RequestMeta {
        ip: extract_client_ip(req),
        user_agent: header(actix_web::http::header::USER_AGENT),
        referrer: header(actix_web::http::header::REFERER),
    }
}

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        service: web::Data<ResolutionService>,
    ) -> HttpResponse {
        let request_id = request_id_of(&req);
        let captured_path = path.into_inner();
        trace!("Resolving path: {}", captured_path);

        let meta = request_meta(&req);
        match service
            .resolve_path(&captured_path, &meta, &request_id)
            .await
        {
            Ok(link) => ok_json(&ResolveResponse {
                long_url: link.target,
            }),
            Err(e) => error_response(&e, &request_id),
        }
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("").route("/{path}*", web::get().to(RedirectService::handle_redirect))
}
