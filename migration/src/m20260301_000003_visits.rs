//! 访问记录表迁移

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Visits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Visits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Visits::LinkId).big_integer().not_null())
                    .col(ColumnDef::new(Visits::IpAddress).string_len(64).not_null())
                    .col(ColumnDef::new(Visits::UserAgent).text().null())
                    .col(ColumnDef::new(Visits::DeviceType).string_len(16).not_null())
                    .col(ColumnDef::new(Visits::Os).string_len(64).not_null())
                    .col(ColumnDef::new(Visits::Browser).string_len(64).not_null())
                    .col(ColumnDef::new(Visits::Referrer).text().not_null())
                    .col(ColumnDef::new(Visits::Location).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Visits::VisitedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visits_link_time")
                    .table(Visits::Table)
                    .col(Visits::LinkId)
                    .col(Visits::VisitedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_visits_link_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Visits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Visits {
    #[sea_orm(iden = "visits")]
    Table,
    Id,
    LinkId,
    IpAddress,
    UserAgent,
    DeviceType,
    Os,
    Browser,
    Referrer,
    Location,
    VisitedAt,
}
