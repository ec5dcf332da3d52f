use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeJobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScrapeJobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScrapeJobs::Mode).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapeJobs::TargetUrls).json().not_null())
                    .col(ColumnDef::new(ScrapeJobs::Status).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapeJobs::RetryCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeJobs::MaxAttempts).integer().not_null().default(3))
                    .col(ColumnDef::new(ScrapeJobs::FailureReason).text())
                    .col(ColumnDef::new(ScrapeJobs::RetriedFrom).uuid())
                    .col(ColumnDef::new(ScrapeJobs::PagesScraped).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeJobs::LockToken).uuid())
                    .col(ColumnDef::new(ScrapeJobs::LockExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ScrapeJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ScrapeJobs::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeJobs::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ScrapeJobs::UpdatedAt)
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
                    .table(ScrapedPages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScrapedPages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScrapedPages::JobId).uuid().not_null())
                    .col(ColumnDef::new(ScrapedPages::Url).text().not_null())
                    .col(ColumnDef::new(ScrapedPages::FinalUrl).text())
                    .col(ColumnDef::new(ScrapedPages::HttpStatus).integer())
                    .col(ColumnDef::new(ScrapedPages::Platform).string_len(20).not_null())
                    .col(ColumnDef::new(ScrapedPages::PlatformConfidence).double().not_null().default(0.0))
                    .col(ColumnDef::new(ScrapedPages::IsProductPage).boolean().not_null().default(false))
                    .col(ColumnDef::new(ScrapedPages::Fields).json().not_null())
                    .col(ColumnDef::new(ScrapedPages::QualityScore).double().not_null().default(0.0))
                    .col(ColumnDef::new(ScrapedPages::ContentHash).string_len(64))
                    .col(ColumnDef::new(ScrapedPages::FetchedWith).string_len(20))
                    .col(ColumnDef::new(ScrapedPages::ResponseTimeMs).big_integer())
                    .col(ColumnDef::new(ScrapedPages::Attempts).json().not_null())
                    .col(
                        ColumnDef::new(ScrapedPages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scraped_pages_job_id")
                            .from(ScrapedPages::Table, ScrapedPages::JobId)
                            .to(ScrapeJobs::Table, ScrapeJobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapedPages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScrapeJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum ScrapeJobs {
    Table,
    Id,
    Mode,
    TargetUrls,
    Status,
    RetryCount,
    MaxAttempts,
    FailureReason,
    RetriedFrom,
    PagesScraped,
    LockToken,
    LockExpiresAt,
    CreatedAt,
    StartedAt,
    CompletedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum ScrapedPages {
    Table,
    Id,
    JobId,
    Url,
    FinalUrl,
    HttpStatus,
    Platform,
    PlatformConfidence,
    IsProductPage,
    Fields,
    QualityScore,
    ContentHash,
    FetchedWith,
    ResponseTimeMs,
    Attempts,
    CreatedAt,
}
