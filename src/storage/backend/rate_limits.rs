//! 限流记录（滑动窗口）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry::Replay;
use crate::errors::{CompactError, Result};
use crate::storage::models::WindowSnapshot;
use crate::storage::traits::RateLimitStore;

use migration::entities::rate_limit;

#[derive(Debug, FromQueryResult)]
struct WindowResult {
    hits: i64,
    oldest_expiry: Option<DateTime<Utc>>,
}

#[async_trait]
impl RateLimitStore for SeaOrmStorage {
    async fn purge_expired(&self, identifier: &str, now: DateTime<Utc>) -> Result<()> {
        let db = &self.db;

        self.retry.run("purge_rate_limits", Replay::Idempotent, || {
            rate_limit::Entity::delete_many()
                .filter(rate_limit::Column::Identifier.eq(identifier))
                .filter(rate_limit::Column::ExpiresAt.lte(now))
                .exec(db)
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("清理限流记录失败: {}", e)))?;

        Ok(())
    }

    async fn window_entries(&self, identifier: &str) -> Result<WindowSnapshot> {
        let db = &self.db;

        let row = self.retry.run("count_rate_limits", Replay::Idempotent, || {
            rate_limit::Entity::find()
                .select_only()
                .column_as(rate_limit::Column::Id.count(), "hits")
                .column_as(rate_limit::Column::ExpiresAt.min(), "oldest_expiry")
                .filter(rate_limit::Column::Identifier.eq(identifier))
                .into_model::<WindowResult>()
                .one(db)
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("统计限流记录失败: {}", e)))?;

        Ok(match row {
            Some(r) => WindowSnapshot {
                count: r.hits.max(0) as u64,
                oldest_expiry: r.oldest_expiry,
            },
            None => WindowSnapshot {
                count: 0,
                oldest_expiry: None,
            },
        })
    }

    async fn record_hit(
        &self,
        identifier: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        use sea_orm::ActiveValue::*;

        let db = &self.db;
        let active = rate_limit::ActiveModel {
            id: NotSet,
            identifier: Set(identifier.to_string()),
            created_at: Set(created_at),
            expires_at: Set(expires_at),
        };

        self.retry.run("record_rate_limit_hit", Replay::AtMostOnce, || {
            let active = active.clone();
            async move { active.insert(db).await }
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("写入限流记录失败: {}", e)))?;

        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;

        let result = self.retry.run("sweep_rate_limits", Replay::Idempotent, || {
            rate_limit::Entity::delete_many()
                .filter(rate_limit::Column::ExpiresAt.lte(now))
                .exec(db)
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("清理过期限流记录失败: {}", e)))?;

        debug!("Swept {} expired rate limit records", result.rows_affected);
        Ok(result.rows_affected)
    }

    fn name(&self) -> &'static str {
        "database"
    }
}
