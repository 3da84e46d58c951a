//! 访问记录（只追加）

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use super::converters::model_to_visit;
use super::SeaOrmStorage;
use super::retry::Replay;
use crate::errors::{CompactError, Result};
use crate::storage::models::{NewVisit, Visit};
use crate::storage::traits::VisitStore;

use migration::entities::visit;

#[async_trait]
impl VisitStore for SeaOrmStorage {
    async fn insert_visit(&self, link_id: i64, new_visit: NewVisit) -> Result<()> {
        use sea_orm::ActiveValue::*;

        let db = &self.db;
        let active = visit::ActiveModel {
            id: NotSet,
            link_id: Set(link_id),
            ip_address: Set(new_visit.ip_address),
            user_agent: Set(new_visit.user_agent),
            device_type: Set(new_visit.device_type.to_string()),
            os: Set(new_visit.os),
            browser: Set(new_visit.browser),
            referrer: Set(new_visit.referrer),
            location: Set(new_visit.location),
            visited_at: Set(new_visit.visited_at),
        };

        self.retry
            .run(
                &format!("insert_visit({})", link_id),
                Replay::AtMostOnce,
                || {
                    let active = active.clone();
                    async move { active.insert(db).await }
                },
            )
            .await
            .map_err(|e| CompactError::database_operation(format!("写入访问记录失败: {}", e)))?;

        Ok(())
    }
}

impl SeaOrmStorage {
    /// 某个链接的访问次数
    pub async fn count_visits(&self, link_id: i64) -> Result<u64> {
        visit::Entity::find()
            .filter(visit::Column::LinkId.eq(link_id))
            .count(&self.db)
            .await
            .map_err(|e| CompactError::database_operation(format!("统计访问记录失败: {}", e)))
    }

    /// 某个链接的访问记录（按时间先后）
    pub async fn list_visits(&self, link_id: i64) -> Result<Vec<Visit>> {
        let models = visit::Entity::find()
            .filter(visit::Column::LinkId.eq(link_id))
            .order_by_asc(visit::Column::VisitedAt)
            .all(&self.db)
            .await
            .map_err(|e| CompactError::database_operation(format!("查询访问记录失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_visit).collect())
    }
}
