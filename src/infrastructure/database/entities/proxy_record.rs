// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

/// 主键为 `host:port`，认证信息不落库
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "proxy_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub scheme: String,
    pub host: String,
    pub port: i32,
    pub success_count: i64,
    pub failure_count: i64,
    pub consecutive_failures: i32,
    #[sea_orm(column_type = "Double")]
    pub success_rate: f64,
    pub last_used_at: Option<ChronoDateTimeUtc>,
    pub cooldown_until: Option<ChronoDateTimeUtc>,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
