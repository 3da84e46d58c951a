//! Server mode
//!
//! Builds the HTTP server, registers routes and waits for a shutdown signal.

use std::time::Duration;

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    http::header,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api::middleware::{REQUEST_ID_HEADER, RequestIdMiddleware};
use crate::api::services::{compact_routes, redirect_routes};
use crate::config::get_config;
use crate::runtime::lifetime::{self, AppServices};

/// `/compact` 的 CORS 策略；OPTIONS 交给处理函数应答
fn build_cors_middleware(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .disable_preflight()
        .allowed_methods(vec!["GET", "POST", "HEAD", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![
            "x-ratelimit-limit",
            "x-ratelimit-remaining",
            "x-ratelimit-reset",
            "retry-after",
            REQUEST_ID_HEADER,
        ])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// 注册全部路由；`/compact` 必须在兜底的短链路由之前
pub fn configure_routes(cfg: &mut web::ServiceConfig, services: &AppServices) {
    cfg.app_data(web::Data::from(services.creation.clone()))
        .app_data(web::Data::from(services.resolution.clone()))
        .service(compact_routes().wrap(build_cors_middleware(&services.cors_allowed_origins)))
        .service(redirect_routes());
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let services = lifetime::prepare_server_startup(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} CPU cores for the server", cpu_count);

    if config.server.trusted_proxies.is_empty() {
        warn!(
            "No trusted proxies configured. \
             Connections from private IPs will use X-Forwarded-For."
        );
    }
    if config.api.cors_allowed_origins.iter().any(|o| o == "*") {
        info!("CORS: any origin allowed on /compact");
    }

    let sweep_task = services.rate_limiter.spawn_cleanup_task(Duration::from_secs(
        config.rate_limit.cleanup_interval_secs.max(1),
    ));

    // HttpServer 闭包会拿走 services，先留一份用于关闭
    let storage_for_shutdown = (*services.storage).clone();

    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .wrap(RequestIdMiddleware)
            .configure(|cfg| configure_routes(cfg, &services))
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .disable_signals()
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    // 等待服务器退出或关闭信号
    tokio::select! {
        res = &mut server_task => {
            res.context("HTTP server task panicked")?
                .context("HTTP server error")?;
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            handle.stop(true).await;
        }
    }

    lifetime::shutdown::perform_shutdown_tasks(Some(sweep_task), storage_for_shutdown).await;
    warn!("Graceful shutdown: all tasks completed");
    Ok(())
}
