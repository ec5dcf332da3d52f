// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scrape_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mode: String,
    pub target_urls: Json,
    pub status: String,
    pub retry_count: i32,
    pub max_attempts: i32,
    pub failure_reason: Option<String>,
    pub retried_from: Option<Uuid>,
    pub pages_scraped: i32,
    pub lock_token: Option<Uuid>,
    pub lock_expires_at: Option<ChronoDateTimeWithTimeZone>,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub started_at: Option<ChronoDateTimeWithTimeZone>,
    pub completed_at: Option<ChronoDateTimeWithTimeZone>,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::scraped_page::Entity")]
    ScrapedPages,
}

impl Related<super::scraped_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScrapedPages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
