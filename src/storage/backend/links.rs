//! 短链接读写

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter,
    sea_query::Expr,
};
use tracing::{debug, info};

use super::converters::{header_to_column, model_to_shortlink, new_link_to_active_model};
use super::SeaOrmStorage;
use super::retry::{Failure, Replay, classify};
use crate::errors::{CompactError, Result};
use crate::storage::models::{NewShortLink, ShortLink};
use crate::storage::traits::LinkStore;

use migration::entities::short_link;

#[async_trait]
impl LinkStore for SeaOrmStorage {
    async fn insert_link(&self, link: NewShortLink) -> Result<ShortLink> {
        let db = &self.db;
        let active = new_link_to_active_model(&link);

        let result = self.retry
            .run(
                &format!("insert_link({})", link.code),
                Replay::AtMostOnce,
                || {
                    let active = active.clone();
                    async move { active.insert(db).await }
                },
            )
            .await;

        match result {
            Ok(model) => {
                info!(
                    "Short link created: {} (tenant {})",
                    model.short_code, model.tenant_id
                );
                Ok(model_to_shortlink(model))
            }
            Err(e) if classify(&e) == Failure::Conflict => {
                debug!("Short code collision on insert: {}", link.code);
                Err(CompactError::duplicate_code(format!(
                    "短码已存在: {}",
                    link.code
                )))
            }
            Err(e) => Err(CompactError::database_operation(format!(
                "创建短链接失败: {}",
                e
            ))),
        }
    }

    async fn find_link(&self, code: &str, header: Option<&str>) -> Result<Option<ShortLink>> {
        let db = &self.db;
        let header_col = header_to_column(header);

        let model = self.retry.run(&format!("find_link({})", code), Replay::Idempotent, || {
            short_link::Entity::find()
                .filter(short_link::Column::ShortCode.eq(code))
                .filter(short_link::Column::Header.eq(header_col.as_str()))
                .one(db)
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("查询短链接失败: {}", e)))?;

        Ok(model.map(model_to_shortlink))
    }

    async fn link_exists(&self, code: &str, header: Option<&str>) -> Result<bool> {
        let db = &self.db;
        let header_col = header_to_column(header);

        let count = self.retry.run(&format!("link_exists({})", code), Replay::Idempotent, || {
            short_link::Entity::find()
                .filter(short_link::Column::ShortCode.eq(code))
                .filter(short_link::Column::Header.eq(header_col.as_str()))
                .count(db)
        })
        .await
        .map_err(|e| CompactError::database_operation(format!("检查短码失败: {}", e)))?;

        Ok(count > 0)
    }

    async fn increment_click(&self, link_id: i64) -> Result<()> {
        let db = &self.db;

        let result = self.retry
            .run(
                &format!("increment_click({})", link_id),
                Replay::AtMostOnce,
                || {
                    short_link::Entity::update_many()
                        .col_expr(
                            short_link::Column::ClickCount,
                            Expr::col(short_link::Column::ClickCount).add(1),
                        )
                        .filter(short_link::Column::Id.eq(link_id))
                        .exec(db)
                },
            )
            .await
            .map_err(|e| CompactError::database_operation(format!("更新点击数失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(CompactError::not_found(format!(
                "短链接不存在: id={}",
                link_id
            )));
        }
        Ok(())
    }
}
