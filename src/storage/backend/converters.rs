use std::str::FromStr;

use crate::errors::{CompactError, Result};
use crate::storage::models::{NewShortLink, ShortLink, Tenant, Tier, Visit};
use migration::entities::{short_link, tenant, visit};

/// 空字符串 header 表示无 header
pub(crate) fn header_to_column(header: Option<&str>) -> String {
    header.unwrap_or_default().to_string()
}

fn column_to_header(header: String) -> Option<String> {
    if header.is_empty() { None } else { Some(header) }
}

/// 将 Sea-ORM Model 转换为 ShortLink
pub fn model_to_shortlink(model: short_link::Model) -> ShortLink {
    ShortLink {
        id: model.id,
        code: model.short_code,
        header: column_to_header(model.header),
        target: model.target_url,
        tenant_id: model.tenant_id,
        created_at: model.created_at,
        click_count: model.click_count.max(0),
    }
}

/// 将 NewShortLink 转换为 ActiveModel（id 由数据库分配，点击数从 0 开始）
pub fn new_link_to_active_model(link: &NewShortLink) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::*;

    short_link::ActiveModel {
        id: NotSet,
        short_code: Set(link.code.clone()),
        header: Set(header_to_column(link.header.as_deref())),
        target_url: Set(link.target.clone()),
        tenant_id: Set(link.tenant_id.clone()),
        created_at: Set(link.created_at),
        click_count: Set(0),
    }
}

/// 将 Sea-ORM Model 转换为 Tenant；未知 tier 视为数据错误
pub fn model_to_tenant(model: tenant::Model) -> Result<Tenant> {
    let tier = Tier::from_str(&model.tier).map_err(|_| {
        CompactError::database_operation(format!(
            "租户 {} 的 tier 无效: {}",
            model.id, model.tier
        ))
    })?;

    Ok(Tenant {
        id: model.id,
        access_token: model.access_token,
        tier,
        links_this_month: model.links_this_month.max(0),
        link_limit_reset_date: model.link_limit_reset_date,
        api_calls_today: model.api_calls_today.max(0),
        api_call_reset_time: model.api_call_reset_time,
        link_count: model.link_count.max(0),
        created_at: model.created_at,
    })
}

pub fn model_to_visit(model: visit::Model) -> Visit {
    Visit {
        id: model.id,
        link_id: model.link_id,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        device_type: model.device_type,
        os: model.os,
        browser: model.browser,
        referrer: model.referrer,
        location: model.location,
        visited_at: model.visited_at,
    }
}
