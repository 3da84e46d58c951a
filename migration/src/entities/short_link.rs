use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "short_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub short_code: String,
    /// 空字符串表示无 header（唯一索引里 NULL 互不冲突，所以不用 NULL）
    pub header: String,
    #[sea_orm(column_type = "Text")]
    pub target_url: String,
    pub tenant_id: String,
    pub created_at: DateTimeUtc,
    pub click_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
