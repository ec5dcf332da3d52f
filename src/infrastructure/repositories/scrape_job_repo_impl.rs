// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use crate::domain::repositories::scrape_job_repository::{JobFilter, ScrapeJobRepository};
use crate::infrastructure::database::entities::scrape_job as job_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{
    sea_query::{LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 抓取任务仓库实现
///
/// 基于SeaORM实现，Postgres 上使用 `FOR UPDATE SKIP LOCKED` 领取任务
#[derive(Clone)]
pub struct ScrapeJobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapeJobRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for ScrapeJob {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let mode = model
            .mode
            .parse()
            .map_err(|_| RepositoryError::Serialization(format!("unknown job mode '{}'", model.mode)))?;
        let status = model.status.parse().map_err(|_| {
            RepositoryError::Serialization(format!("unknown job status '{}'", model.status))
        })?;
        let target_urls: Vec<String> = serde_json::from_value(model.target_urls)?;

        Ok(Self {
            id: model.id,
            mode,
            target_urls,
            status,
            retry_count: model.retry_count,
            max_attempts: model.max_attempts,
            failure_reason: model.failure_reason,
            retried_from: model.retried_from,
            pages_scraped: model.pages_scraped,
            lock_token: model.lock_token,
            lock_expires_at: model.lock_expires_at,
            created_at: model.created_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&ScrapeJob> for job_entity::ActiveModel {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            id: Set(job.id),
            mode: Set(job.mode.to_string()),
            target_urls: Set(serde_json::Value::from(job.target_urls.clone())),
            status: Set(job.status.to_string()),
            retry_count: Set(job.retry_count),
            max_attempts: Set(job.max_attempts),
            failure_reason: Set(job.failure_reason.clone()),
            retried_from: Set(job.retried_from),
            pages_scraped: Set(job.pages_scraped),
            lock_token: Set(job.lock_token),
            lock_expires_at: Set(job.lock_expires_at),
            created_at: Set(job.created_at),
            started_at: Set(job.started_at),
            completed_at: Set(job.completed_at),
            updated_at: Set(job.updated_at),
        }
    }
}

#[async_trait]
impl ScrapeJobRepository for ScrapeJobRepositoryImpl {
    async fn create(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        let inserted = model.insert(self.db.as_ref()).await?;
        inserted.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(ScrapeJob::try_from)
            .transpose()
    }

    async fn update(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError> {
        let txn = self.db.begin().await?;

        let existing = find_for_update(&txn, job.id).await?;
        if let Err(e) = ensure_not_terminal(&existing) {
            txn.rollback().await?;
            return Err(e);
        }

        let model: job_entity::ActiveModel = job.into();
        let updated = model.update(&txn).await?;
        txn.commit().await?;

        updated.try_into()
    }

    async fn renew_lease(
        &self,
        job: &ScrapeJob,
        worker_id: Uuid,
        lease: Duration,
    ) -> Result<ScrapeJob, RepositoryError> {
        let txn = self.db.begin().await?;

        let existing = find_for_update(&txn, job.id).await?;
        if let Err(e) = ensure_not_terminal(&existing).and_then(|_| ensure_owner(&existing, worker_id)) {
            txn.rollback().await?;
            return Err(e);
        }

        let now: DateTime<FixedOffset> = Utc::now().into();
        let mut model: job_entity::ActiveModel = existing.into();
        model.retry_count = Set(job.retry_count);
        model.pages_scraped = Set(job.pages_scraped);
        model.lock_expires_at = Set(Some(now + lease));
        model.updated_at = Set(now);
        let updated = model.update(&txn).await?;
        txn.commit().await?;

        debug!(job_id = %job.id, worker_id = %worker_id, "Lease renewed");
        updated.try_into()
    }

    async fn complete(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, RepositoryError> {
        let txn = self.db.begin().await?;

        let existing = find_for_update(&txn, job.id).await?;
        if let Err(e) = ensure_not_terminal(&existing).and_then(|_| ensure_owner(&existing, worker_id)) {
            txn.rollback().await?;
            return Err(e);
        }

        let model: job_entity::ActiveModel = job.into();
        let updated = model.update(&txn).await?;
        txn.commit().await?;

        updated.try_into()
    }

    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lease: Duration,
    ) -> Result<Option<ScrapeJob>, RepositoryError> {
        let txn = self.db.begin().await?;
        let now: DateTime<FixedOffset> = Utc::now().into();

        let mut query = job_entity::Entity::find()
            .filter(
                Condition::any()
                    .add(job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
                    .add(
                        Condition::all()
                            .add(job_entity::Column::Status.eq(JobStatus::Running.to_string()))
                            .add(job_entity::Column::LockExpiresAt.lte(now)),
                    ),
            )
            .order_by_asc(job_entity::Column::CreatedAt);
        if txn.get_database_backend() == DatabaseBackend::Postgres {
            query = query.lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
        }

        let Some(model) = query.one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };

        let job = ScrapeJob::try_from(model)?;
        let mut job = match job.status {
            JobStatus::Queued => job
                .start()
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?,
            _ => {
                debug!(job_id = %job.id, "Reclaiming job with expired lease");
                job
            }
        };
        job.lock_token = Some(worker_id);
        job.lock_expires_at = Some(now + lease);
        job.updated_at = now;

        let model: job_entity::ActiveModel = (&job).into();
        let updated = model.update(&txn).await?;
        txn.commit().await?;

        updated.try_into().map(Some)
    }

    async fn list(&self, filter: JobFilter) -> Result<Vec<ScrapeJob>, RepositoryError> {
        let mut query = job_entity::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(job_entity::Column::Status.eq(status.to_string()));
        }
        if let Some(mode) = filter.mode {
            query = query.filter(job_entity::Column::Mode.eq(mode.to_string()));
        }

        query
            .order_by_desc(job_entity::Column::CreatedAt)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ScrapeJob::try_from)
            .collect()
    }
}

/// 读取任务行，Postgres 上加行锁
async fn find_for_update(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<job_entity::Model, RepositoryError> {
    let mut query = job_entity::Entity::find_by_id(id);
    if txn.get_database_backend() == DatabaseBackend::Postgres {
        query = query.lock(LockType::Update);
    }
    query.one(txn).await?.ok_or(RepositoryError::NotFound)
}

fn ensure_not_terminal(existing: &job_entity::Model) -> Result<(), RepositoryError> {
    let stored_status: JobStatus = existing.status.parse().unwrap_or_default();
    if stored_status.is_terminal() {
        return Err(RepositoryError::Conflict(format!(
            "job {} is already {}",
            existing.id, stored_status
        )));
    }
    Ok(())
}

fn ensure_owner(existing: &job_entity::Model, worker_id: Uuid) -> Result<(), RepositoryError> {
    if existing.lock_token != Some(worker_id) {
        return Err(RepositoryError::Conflict(format!(
            "lease on job {} is held by another worker",
            existing.id
        )));
    }
    Ok(())
}
