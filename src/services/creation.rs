//! Short link creation
//!
//! Validate input → authenticate bearer → rate limit (keyed by token) →
//! fetch tenant → apply due quota resets → quota check → mint a unique
//! code and persist → bump tenant usage counters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::code_generator::{Attempt, CodeGenerator};
use super::quota::QuotaManager;
use super::rate_limiter::{RateLimitStatus, RateLimiter};
use crate::config::StaticConfig;
use crate::errors::{CompactError, Result};
use crate::storage::{LinkStore, NewShortLink, ShortLink, Tenant, TenantStore, bounded};
use crate::utils::{is_valid_header, validate_and_sanitize};

/// JSON body of `POST /compact`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactRequest {
    pub long_url: String,
    #[serde(default)]
    pub header: Option<String>,
}

/// Validated creation input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub target: String,
    pub header: Option<String>,
}

/// Limits applied before any store is touched
#[derive(Debug, Clone)]
pub struct CreationSettings {
    pub base_url: String,
    pub max_body_bytes: usize,
    pub min_token_length: usize,
    pub max_url_length: usize,
    pub max_header_length: usize,
}

impl CreationSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            base_url: config.links.base_url.trim_end_matches('/').to_string(),
            max_body_bytes: config.api.max_body_bytes,
            min_token_length: config.api.min_token_length,
            max_url_length: config.links.max_url_length,
            max_header_length: config.links.max_header_length,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatedLink {
    pub link: ShortLink,
    pub short_url: String,
    pub rate_limit: RateLimitStatus,
}

pub struct CreationService {
    links: Arc<dyn LinkStore>,
    tenants: Arc<dyn TenantStore>,
    rate_limiter: Arc<RateLimiter>,
    quota: QuotaManager,
    generator: CodeGenerator,
    settings: CreationSettings,
    timeout: Duration,
}

impl CreationService {
    pub fn new(
        links: Arc<dyn LinkStore>,
        tenants: Arc<dyn TenantStore>,
        rate_limiter: Arc<RateLimiter>,
        quota: QuotaManager,
        generator: CodeGenerator,
        settings: CreationSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            links,
            tenants,
            rate_limiter,
            quota,
            generator,
            settings,
            timeout,
        }
    }

    pub fn settings(&self) -> &CreationSettings {
        &self.settings
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Parse and validate the raw request body
    pub fn validate_body(&self, body: &[u8]) -> Result<ValidatedRequest> {
        if body.len() > self.settings.max_body_bytes {
            return Err(CompactError::payload_too_large(format!(
                "Request body exceeds {} bytes",
                self.settings.max_body_bytes
            )));
        }

        let malformed = |detail: String| {
            CompactError::malformed_body(format!(
                "Request body must be a JSON object with a longUrl string: {}",
                detail
            ))
        };

        // 派生的 Deserialize 也接受数组形式，先确认是对象
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(malformed("top-level value is not an object".to_string()));
        }
        let request: CompactRequest =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;

        let target = validate_and_sanitize(&request.long_url, self.settings.max_url_length)
            .map_err(|e| CompactError::invalid_url(e.to_string()))?;

        let header = match request.header.filter(|h| !h.is_empty()) {
            Some(h) if !is_valid_header(&h, self.settings.max_header_length) => {
                return Err(CompactError::invalid_header(format!(
                    "Header must be 1-{} characters of letters, digits, '-' or '_'",
                    self.settings.max_header_length
                )));
            }
            other => other,
        };

        Ok(ValidatedRequest { target, header })
    }

    /// Extract the bearer token from an `Authorization` header value
    pub fn bearer_token<'a>(&self, authorization: Option<&'a str>) -> Result<&'a str> {
        let value = authorization
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CompactError::missing_credentials("Missing Authorization header"))?;

        let token = match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => {
                return Err(CompactError::missing_credentials(
                    "Authorization header must use the Bearer scheme",
                ));
            }
        };

        if token.is_empty() {
            return Err(CompactError::missing_credentials("Missing bearer token"));
        }
        if token.len() < self.settings.min_token_length {
            return Err(CompactError::invalid_credentials("Invalid access token"));
        }
        Ok(token)
    }

    pub async fn create(
        &self,
        body: &[u8],
        authorization: Option<&str>,
        request_id: &str,
    ) -> Result<CreatedLink> {
        self.create_at(body, authorization, request_id, Utc::now())
            .await
    }

    pub async fn create_at(
        &self,
        body: &[u8],
        authorization: Option<&str>,
        request_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CreatedLink> {
        let request = self.validate_body(body)?;
        let token = self.bearer_token(authorization)?;

        let rate_limit = self.rate_limiter.check_limit_at(token, now).await;
        if !rate_limit.allowed {
            return Err(CompactError::RateLimited(rate_limit));
        }

        let tenant = bounded(
            "tenant.find_by_token",
            self.timeout,
            self.tenants.find_by_token(token),
        )
        .await?
        .ok_or_else(|| CompactError::invalid_credentials("Invalid access token"))?;

        let tenant = self.apply_quota_resets(tenant, now, request_id).await;

        let decision = self.quota.check_limits(&tenant);
        if !decision.allowed {
            let reason = decision
                .reason
                .unwrap_or_else(|| "Quota exceeded".to_string());
            info!("Quota denied for tenant {}: {}", tenant.id, reason);
            return Err(CompactError::quota_exceeded(reason));
        }

        let link = self.persist_unique(&request, &tenant, now).await?;

        if let Err(e) = bounded(
            "tenant.record_link_created",
            self.timeout,
            self.tenants.record_link_created(&tenant.id),
        )
        .await
        {
            warn!(
                request_id,
                "Failed to update usage counters for tenant {}: {}", tenant.id, e
            );
        }

        let short_url = format!("{}/{}", self.settings.base_url, link.path());
        info!(
            "Created short link {} -> {} for tenant {}",
            short_url, link.target, tenant.id
        );

        Ok(CreatedLink {
            link,
            short_url,
            rate_limit,
        })
    }

    /// Plan and persist due resets; a failed write keeps the in-memory
    /// reset snapshot for this request.
    async fn apply_quota_resets(
        &self,
        tenant: Tenant,
        now: DateTime<Utc>,
        request_id: &str,
    ) -> Tenant {
        let plan = self.quota.plan_reset(&tenant, now);
        if plan.update.is_empty() {
            return tenant;
        }

        debug!("Applying quota reset for tenant {}: {:?}", tenant.id, plan.update);
        if let Err(e) = bounded(
            "tenant.apply_update",
            self.timeout,
            self.tenants.apply_update(&tenant.id, &plan.update),
        )
        .await
        {
            warn!(
                request_id,
                "Failed to persist quota reset for tenant {}: {}", tenant.id, e
            );
        }
        plan.tenant
    }

    async fn persist_unique(
        &self,
        request: &ValidatedRequest,
        tenant: &Tenant,
        now: DateTime<Utc>,
    ) -> Result<ShortLink> {
        let header = request.header.as_deref();

        self.generator
            .generate_unique(|code| async move {
                let taken = bounded(
                    "link.exists",
                    self.timeout,
                    self.links.link_exists(&code, header),
                )
                .await?;
                if taken {
                    return Ok(Attempt::Collision);
                }

                let new_link = NewShortLink {
                    code,
                    header: request.header.clone(),
                    target: request.target.clone(),
                    tenant_id: tenant.id.clone(),
                    created_at: now,
                };
                match bounded("link.insert", self.timeout, self.links.insert_link(new_link)).await
                {
                    Ok(link) => Ok(Attempt::Accepted(link)),
                    // 检查和插入之间被别人抢先
                    Err(CompactError::DuplicateCode(_)) => Ok(Attempt::Collision),
                    Err(e) => Err(e),
                }
            })
            .await
    }
}
