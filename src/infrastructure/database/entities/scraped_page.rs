// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scraped_pages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub url: String,
    pub final_url: Option<String>,
    pub http_status: Option<i32>,
    pub platform: String,
    #[sea_orm(column_type = "Double")]
    pub platform_confidence: f64,
    pub is_product_page: bool,
    pub fields: Json,
    #[sea_orm(column_type = "Double")]
    pub quality_score: f64,
    pub content_hash: Option<String>,
    pub fetched_with: Option<String>,
    pub response_time_ms: Option<i64>,
    pub attempts: Json,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scrape_job::Entity",
        from = "Column::JobId",
        to = "super::scrape_job::Column::Id"
    )]
    ScrapeJob,
}

impl Related<super::scrape_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScrapeJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
