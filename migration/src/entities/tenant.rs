//! Tenant entity
//!
//! Tenants are provisioned by the account service; this crate reads them
//! for bearer-token authentication and maintains the usage counters.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub access_token: String,
    /// free | basic | pro | enterprise
    pub tier: String,
    pub links_this_month: i64,
    pub link_limit_reset_date: DateTimeUtc,
    pub api_calls_today: i64,
    pub api_call_reset_time: DateTimeUtc,
    pub link_count: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
