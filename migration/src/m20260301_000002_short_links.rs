//! 短链接表迁移
//!
//! 唯一性约束落在 (short_code, header) 上：同一个 code 可以在无 header
//! 和每个不同 header 下各存在一次。并发创建时由该索引保证不重复。
//! 两列都区分大小写，`AbC1234` 与 `abc1234` 是不同的短码。

use sea_orm_migration::prelude::*;

use crate::case_sensitive;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(ShortLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortLinks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(case_sensitive(
                        backend,
                        ColumnDef::new(ShortLinks::ShortCode)
                            .string_len(64)
                            .not_null(),
                    ))
                    .col(case_sensitive(
                        backend,
                        ColumnDef::new(ShortLinks::Header)
                            .string_len(50)
                            .not_null()
                            .default(""),
                    ))
                    .col(ColumnDef::new(ShortLinks::TargetUrl).text().not_null())
                    .col(
                        ColumnDef::new(ShortLinks::TenantId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_code_header")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::ShortCode)
                    .col(ShortLinks::Header)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_tenant")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::TenantId)
                    .col(ShortLinks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_short_links_tenant").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_short_links_code_header").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortLinks {
    #[sea_orm(iden = "short_links")]
    Table,
    Id,
    ShortCode,
    Header,
    TargetUrl,
    TenantId,
    CreatedAt,
    ClickCount,
}
