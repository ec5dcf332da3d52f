use sea_orm_migration::prelude::*;

use crate::m20260101_000001_create_scrape_jobs::{ScrapeJobs, ScrapedPages};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 领取任务：status + created_at
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scrape_jobs_status_created_at")
                    .table(ScrapeJobs::Table)
                    .col(ScrapeJobs::Status)
                    .col(ScrapeJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scrape_jobs_lock_expires_at")
                    .table(ScrapeJobs::Table)
                    .col(ScrapeJobs::LockExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scraped_pages_job_id")
                    .table(ScrapedPages::Table)
                    .col(ScrapedPages::JobId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scraped_pages_job_id")
                    .table(ScrapedPages::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scrape_jobs_lock_expires_at")
                    .table(ScrapeJobs::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scrape_jobs_status_created_at")
                    .table(ScrapeJobs::Table)
                    .to_owned(),
            )
            .await
    }
}
