//! 租户读取与用量计数

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, QueryFilter, sea_query::Expr,
};
use tracing::info;

use super::converters::model_to_tenant;
use super::SeaOrmStorage;
use super::retry::Replay;
use crate::errors::{CompactError, Result};
use crate::services::quota::first_of_next_month;
use crate::storage::models::{Tenant, TenantUpdate, Tier};
use crate::storage::traits::TenantStore;

use migration::entities::tenant;

#[async_trait]
impl TenantStore for SeaOrmStorage {
    async fn find_by_token(&self, token: &str) -> Result<Option<Tenant>> {
        let db = &self.db;

        let model = self.retry.run("find_tenant_by_token", Replay::Idempotent, || {
            tenant::Entity::find()
                .filter(tenant::Column::AccessToken.eq(token))
                .one(db)
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("查询租户失败: {}", e)))?;

        model.map(model_to_tenant).transpose()
    }

    async fn apply_update(&self, tenant_id: &str, update: &TenantUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let db = &self.db;
        self.retry
            .run(
                &format!("apply_tenant_update({})", tenant_id),
                Replay::Idempotent,
                || {
                    let mut query = tenant::Entity::update_many();
                    if let Some(v) = update.links_this_month {
                        query = query.col_expr(tenant::Column::LinksThisMonth, Expr::value(v));
                    }
                    if let Some(v) = update.link_limit_reset_date {
                        query = query.col_expr(tenant::Column::LinkLimitResetDate, Expr::value(v));
                    }
                    if let Some(v) = update.api_calls_today {
                        query = query.col_expr(tenant::Column::ApiCallsToday, Expr::value(v));
                    }
                    if let Some(v) = update.api_call_reset_time {
                        query = query.col_expr(tenant::Column::ApiCallResetTime, Expr::value(v));
                    }
                    query.filter(tenant::Column::Id.eq(tenant_id)).exec(db)
                },
            )
            .await
            .map_err(|e| CompactError::database_operation(format!("更新租户配额失败: {}", e)))?;

        Ok(())
    }

    async fn record_link_created(&self, tenant_id: &str) -> Result<()> {
        let db = &self.db;

        self.retry
            .run(
                &format!("record_link_created({})", tenant_id),
                Replay::AtMostOnce,
                || {
                    tenant::Entity::update_many()
                        .col_expr(
                            tenant::Column::ApiCallsToday,
                            Expr::col(tenant::Column::ApiCallsToday).add(1),
                        )
                        .col_expr(
                            tenant::Column::LinksThisMonth,
                            Expr::col(tenant::Column::LinksThisMonth).add(1),
                        )
                        .col_expr(
                            tenant::Column::LinkCount,
                            Expr::col(tenant::Column::LinkCount).add(1),
                        )
                        .filter(tenant::Column::Id.eq(tenant_id))
                        .exec(db)
                },
            )
            .await
            .map_err(|e| CompactError::database_operation(format!("更新租户用量失败: {}", e)))?;

        Ok(())
    }
}

impl SeaOrmStorage {
    /// 新建租户（计数器清零），token 为空时自动生成
    pub async fn create_tenant(&self, tier: Tier, token: Option<String>) -> Result<Tenant> {
        self.create_tenant_at(tier, token, Utc::now()).await
    }

    pub async fn create_tenant_at(
        &self,
        tier: Tier,
        token: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Tenant> {
        use sea_orm::ActiveValue::Set;

        let token = token.unwrap_or_else(generate_access_token);
        let active = tenant::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            access_token: Set(token),
            tier: Set(tier.to_string()),
            links_this_month: Set(0),
            link_limit_reset_date: Set(first_of_next_month(now)),
            api_calls_today: Set(0),
            api_call_reset_time: Set(now),
            link_count: Set(0),
            created_at: Set(now),
        };

        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| CompactError::database_operation(format!("创建租户失败: {}", e)))?;

        info!("Tenant created: {} ({})", model.id, model.tier);
        model_to_tenant(model)
    }

    /// 按 id 读取租户
    pub async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>> {
        tenant::Entity::find_by_id(tenant_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| CompactError::database_operation(format!("查询租户失败: {}", e)))?
            .map(model_to_tenant)
            .transpose()
    }

    /// 直接覆盖租户计数器（运维修正与测试场景）
    pub async fn overwrite_tenant_usage(&self, tenant: &Tenant) -> Result<()> {
        tenant::Entity::update_many()
            .col_expr(
                tenant::Column::LinksThisMonth,
                Expr::value(tenant.links_this_month),
            )
            .col_expr(
                tenant::Column::LinkLimitResetDate,
                Expr::value(tenant.link_limit_reset_date),
            )
            .col_expr(
                tenant::Column::ApiCallsToday,
                Expr::value(tenant.api_calls_today),
            )
            .col_expr(
                tenant::Column::ApiCallResetTime,
                Expr::value(tenant.api_call_reset_time),
            )
            .col_expr(tenant::Column::LinkCount, Expr::value(tenant.link_count))
            .filter(tenant::Column::Id.eq(tenant.id.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| CompactError::database_operation(format!("更新租户失败: {}", e)))?;
        Ok(())
    }
}

/// 生成访问令牌（前缀 + 32 位十六进制）
pub fn generate_access_token() -> String {
    format!("cl_{}", uuid::Uuid::new_v4().simple())
}
