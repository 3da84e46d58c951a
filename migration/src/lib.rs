pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

pub mod entities;
mod m20260301_000001_tenants;
mod m20260301_000002_short_links;
mod m20260301_000003_visits;
mod m20260301_000004_rate_limits;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_tenants::Migration),
            Box::new(m20260301_000002_short_links::Migration),
            Box::new(m20260301_000003_visits::Migration),
            Box::new(m20260301_000004_rate_limits::Migration),
        ]
    }
}

/// MySQL 默认的 *_ci 排序规则不区分大小写，短码、header 和 token 必须按字节比较
pub(crate) fn case_sensitive(backend: DatabaseBackend, column: &mut ColumnDef) -> ColumnDef {
    if backend == DatabaseBackend::MySql {
        column.extra("COLLATE utf8mb4_bin");
    }
    column.to_owned()
}
