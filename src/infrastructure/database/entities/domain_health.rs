// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "domain_health")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain: String,
    pub total_requests: i64,
    pub success_count: i64,
    pub failure_count: i64,
    pub blocked_count: i64,
    #[sea_orm(column_type = "Double")]
    pub success_rate: f64,
    #[sea_orm(column_type = "Double")]
    pub avg_latency_ms: f64,
    pub consecutive_failures: i32,
    pub last_request_at: Option<ChronoDateTimeUtc>,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
