//! 限流记录表迁移
//!
//! 每次放行的请求插入一行，过期后由读取时的惰性清理和后台定时清理删除。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RateLimits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RateLimits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RateLimits::Identifier)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RateLimits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RateLimits::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rate_limits_identifier_expires")
                    .table(RateLimits::Table)
                    .col(RateLimits::Identifier)
                    .col(RateLimits::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // 后台清理按过期时间扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rate_limits_expires_at")
                    .table(RateLimits::Table)
                    .col(RateLimits::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_rate_limits_expires_at").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_rate_limits_identifier_expires")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(RateLimits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RateLimits {
    #[sea_orm(iden = "rate_limits")]
    Table,
    Id,
    Identifier,
    CreatedAt,
    ExpiresAt,
}
