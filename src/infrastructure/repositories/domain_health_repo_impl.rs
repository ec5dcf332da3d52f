// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_health::DomainHealth;
use crate::domain::repositories::domain_health_repository::DomainHealthRepository;
use crate::infrastructure::database::entities::domain_health as health_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;

/// 域名健康统计仓库实现
pub struct DomainHealthRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DomainHealthRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<health_entity::Model> for DomainHealth {
    fn from(model: health_entity::Model) -> Self {
        Self {
            domain: model.domain,
            total_requests: model.total_requests,
            success_count: model.success_count,
            failure_count: model.failure_count,
            blocked_count: model.blocked_count,
            success_rate: model.success_rate,
            avg_latency_ms: model.avg_latency_ms,
            consecutive_failures: model.consecutive_failures,
            last_request_at: model.last_request_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&DomainHealth> for health_entity::ActiveModel {
    fn from(health: &DomainHealth) -> Self {
        Self {
            domain: Set(health.domain.clone()),
            total_requests: Set(health.total_requests),
            success_count: Set(health.success_count),
            failure_count: Set(health.failure_count),
            blocked_count: Set(health.blocked_count),
            success_rate: Set(health.success_rate),
            avg_latency_ms: Set(health.avg_latency_ms),
            consecutive_failures: Set(health.consecutive_failures),
            last_request_at: Set(health.last_request_at),
            updated_at: Set(health.updated_at),
        }
    }
}

#[async_trait]
impl DomainHealthRepository for DomainHealthRepositoryImpl {
    async fn upsert(&self, health: &DomainHealth) -> Result<(), RepositoryError> {
        let active_model: health_entity::ActiveModel = health.into();
        health_entity::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(health_entity::Column::Domain)
                    .update_columns([
                        health_entity::Column::TotalRequests,
                        health_entity::Column::SuccessCount,
                        health_entity::Column::FailureCount,
                        health_entity::Column::BlockedCount,
                        health_entity::Column::SuccessRate,
                        health_entity::Column::AvgLatencyMs,
                        health_entity::Column::ConsecutiveFailures,
                        health_entity::Column::LastRequestAt,
                        health_entity::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<DomainHealth>, RepositoryError> {
        let model = health_entity::Entity::find_by_id(domain.to_lowercase())
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<DomainHealth>, RepositoryError> {
        let models = health_entity::Entity::find()
            .order_by_asc(health_entity::Column::Domain)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
