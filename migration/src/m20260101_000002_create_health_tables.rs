use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProxyRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProxyRecords::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ProxyRecords::Scheme).string_len(10).not_null())
                    .col(ColumnDef::new(ProxyRecords::Host).string().not_null())
                    .col(ColumnDef::new(ProxyRecords::Port).integer().not_null())
                    .col(ColumnDef::new(ProxyRecords::SuccessCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(ProxyRecords::FailureCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(ProxyRecords::ConsecutiveFailures).integer().not_null().default(0))
                    .col(ColumnDef::new(ProxyRecords::SuccessRate).double().not_null().default(1.0))
                    .col(ColumnDef::new(ProxyRecords::LastUsedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ProxyRecords::CooldownUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ProxyRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DomainHealth::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DomainHealth::Domain).string().not_null().primary_key())
                    .col(ColumnDef::new(DomainHealth::TotalRequests).big_integer().not_null().default(0))
                    .col(ColumnDef::new(DomainHealth::SuccessCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(DomainHealth::FailureCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(DomainHealth::BlockedCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(DomainHealth::SuccessRate).double().not_null().default(1.0))
                    .col(ColumnDef::new(DomainHealth::AvgLatencyMs).double().not_null().default(0.0))
                    .col(ColumnDef::new(DomainHealth::ConsecutiveFailures).integer().not_null().default(0))
                    .col(ColumnDef::new(DomainHealth::LastRequestAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(DomainHealth::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DomainHealth::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProxyRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProxyRecords {
    Table,
    Id,
    Scheme,
    Host,
    Port,
    SuccessCount,
    FailureCount,
    ConsecutiveFailures,
    SuccessRate,
    LastUsedAt,
    CooldownUntil,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DomainHealth {
    Table,
    Domain,
    TotalRequests,
    SuccessCount,
    FailureCount,
    BlockedCount,
    SuccessRate,
    AvgLatencyMs,
    ConsecutiveFailures,
    LastRequestAt,
    UpdatedAt,
}
