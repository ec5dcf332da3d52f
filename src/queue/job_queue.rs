// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 只有 Queued 状态的任务可以入队
    #[error("Job {0} is not queued")]
    NotQueued(Uuid),

    /// 只有终态任务可以完成
    #[error("Job {0} has not reached a terminal state")]
    NotTerminal(Uuid),
}

/// 抓取任务队列特质
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 入队任务
    async fn enqueue(&self, job: ScrapeJob) -> Result<ScrapeJob, QueueError>;

    /// 领取下一个任务，返回的任务已是 Running 状态并持有租约
    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<ScrapeJob>, QueueError>;

    /// 续租并写回执行进度，租约已被接管时返回错误
    async fn heartbeat(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, QueueError>;

    /// 由持有租约的 worker 写回终态任务
    async fn finish(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, QueueError>;
}

/// 数据库任务队列实现
///
/// 并发安全依赖仓库的 `acquire_next`。租约须长于单次抓取尝试的最长耗时，
/// 执行中的任务在每次尝试前续租
pub struct DatabaseJobQueue<R: ScrapeJobRepository + ?Sized> {
    /// 任务仓库
    repository: Arc<R>,
    /// 租约时长
    lease: Duration,
}

impl<R: ScrapeJobRepository + ?Sized> DatabaseJobQueue<R> {
    /// 创建新的任务队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `lease` - 领取任务后的租约时长，过期后任务可被其他 worker 重新领取
    pub fn new(repository: Arc<R>, lease: Duration) -> Self {
        Self { repository, lease }
    }
}

#[async_trait]
impl<R: ScrapeJobRepository + ?Sized> JobQueue for DatabaseJobQueue<R> {
    async fn enqueue(&self, job: ScrapeJob) -> Result<ScrapeJob, QueueError> {
        if job.status != JobStatus::Queued {
            return Err(QueueError::NotQueued(job.id));
        }
        Ok(self.repository.create(&job).await?)
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<ScrapeJob>, QueueError> {
        Ok(self.repository.acquire_next(worker_id, self.lease).await?)
    }

    async fn heartbeat(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, QueueError> {
        Ok(self.repository.renew_lease(job, worker_id, self.lease).await?)
    }

    async fn finish(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, QueueError> {
        if !job.is_terminal() {
            return Err(QueueError::NotTerminal(job.id));
        }
        Ok(self.repository.complete(job, worker_id).await?)
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue(&self, job: ScrapeJob) -> Result<ScrapeJob, QueueError> {
        (**self).enqueue(job).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<ScrapeJob>, QueueError> {
        (**self).dequeue(worker_id).await
    }

    async fn heartbeat(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, QueueError> {
        (**self).heartbeat(job, worker_id).await
    }

    async fn finish(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, QueueError> {
        (**self).finish(job, worker_id).await
    }
}
