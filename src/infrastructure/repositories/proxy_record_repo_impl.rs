// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::proxy::{ProxyEndpoint, ProxyRecord};
use crate::domain::repositories::proxy_record_repository::ProxyRecordRepository;
use crate::infrastructure::database::entities::proxy_record as proxy_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;

/// 代理健康记录仓库实现
pub struct ProxyRecordRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ProxyRecordRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<proxy_entity::Model> for ProxyRecord {
    type Error = RepositoryError;

    fn try_from(model: proxy_entity::Model) -> Result<Self, Self::Error> {
        let port = u16::try_from(model.port)
            .map_err(|_| RepositoryError::Serialization(format!("invalid proxy port {}", model.port)))?;
        let mut endpoint = ProxyEndpoint::new(model.host, port, None);
        endpoint.scheme = model.scheme;

        Ok(Self {
            endpoint,
            success_count: model.success_count,
            failure_count: model.failure_count,
            consecutive_failures: model.consecutive_failures,
            success_rate: model.success_rate,
            last_used_at: model.last_used_at,
            cooldown_until: model.cooldown_until,
            updated_at: model.updated_at,
        })
    }
}

#[async_trait]
impl ProxyRecordRepository for ProxyRecordRepositoryImpl {
    async fn upsert(&self, record: &ProxyRecord) -> Result<(), RepositoryError> {
        let active_model = proxy_entity::ActiveModel {
            id: Set(record.id()),
            scheme: Set(record.endpoint.scheme.clone()),
            host: Set(record.endpoint.host.clone()),
            port: Set(i32::from(record.endpoint.port)),
            success_count: Set(record.success_count),
            failure_count: Set(record.failure_count),
            consecutive_failures: Set(record.consecutive_failures),
            success_rate: Set(record.success_rate),
            last_used_at: Set(record.last_used_at),
            cooldown_until: Set(record.cooldown_until),
            updated_at: Set(record.updated_at),
        };

        proxy_entity::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(proxy_entity::Column::Id)
                    .update_columns([
                        proxy_entity::Column::Scheme,
                        proxy_entity::Column::SuccessCount,
                        proxy_entity::Column::FailureCount,
                        proxy_entity::Column::ConsecutiveFailures,
                        proxy_entity::Column::SuccessRate,
                        proxy_entity::Column::LastUsedAt,
                        proxy_entity::Column::CooldownUntil,
                        proxy_entity::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProxyRecord>, RepositoryError> {
        proxy_entity::Entity::find()
            .order_by_asc(proxy_entity::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ProxyRecord::try_from)
            .collect()
    }
}
