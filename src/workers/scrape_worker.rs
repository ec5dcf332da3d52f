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

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::models::scrape_job::ScrapeJob;
use crate::domain::services::recovery_orchestrator::{
    JobProgress, OrchestratorError, RecoveryOrchestrator,
};
use crate::queue::job_queue::{JobQueue, QueueError};
use crate::utils::errors::{RepositoryError, WorkerError};
use crate::workers::worker::Worker;

impl From<QueueError> for WorkerError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Repository(e) => WorkerError::RepositoryError(e),
            other => WorkerError::InternalError(other.to_string()),
        }
    }
}

impl From<OrchestratorError> for WorkerError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Repository(e) => WorkerError::RepositoryError(e),
            OrchestratorError::Domain(e) => WorkerError::DomainError(e.to_string()),
        }
    }
}

/// 通过队列心跳续租的进度回写
struct LeaseKeeper<'a> {
    queue: &'a dyn JobQueue,
    worker_id: Uuid,
}

#[async_trait]
impl JobProgress for LeaseKeeper<'_> {
    async fn checkpoint(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        match self.queue.heartbeat(job, self.worker_id).await {
            Ok(_) => Ok(()),
            Err(QueueError::Repository(e)) => Err(e),
            Err(other) => Err(RepositoryError::Conflict(other.to_string())),
        }
    }
}

/// 抓取工作者
///
/// 每次只执行一个任务：领取 → 编排执行 → 写回终态
pub struct ScrapeWorker {
    queue: Arc<dyn JobQueue>,
    orchestrator: Arc<RecoveryOrchestrator>,
    idle_poll: Duration,
    worker_id: Uuid,
    name: String,
}

impl ScrapeWorker {
    /// 创建新的抓取工作器实例
    ///
    /// # 参数
    ///
    /// * `queue` - 任务队列
    /// * `orchestrator` - 恢复编排器
    /// * `idle_poll` - 队列为空时的等待时间
    pub fn new(
        queue: Arc<dyn JobQueue>,
        orchestrator: Arc<RecoveryOrchestrator>,
        idle_poll: Duration,
    ) -> Self {
        let worker_id = Uuid::new_v4();
        Self {
            queue,
            orchestrator,
            idle_poll,
            worker_id,
            name: format!("scrape-worker-{}", worker_id),
        }
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    /// 处理队列中的下一个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(job))` - 已写回的终态任务
    /// * `Ok(None)` - 队列为空
    pub async fn process_next(&self) -> Result<Option<ScrapeJob>, WorkerError> {
        match self.queue.dequeue(self.worker_id).await? {
            Some(job) => self.process_job(job).await.map(Some),
            None => Ok(None),
        }
    }

    /// 编排器出错时任务保持 Running，租约到期后由其他 worker 重新领取。
    /// 续租失败说明租约已被接管，此时放弃任务，不写回结果。
    #[instrument(skip(self, job), fields(job_id = %job.id, mode = %job.mode, worker_id = %self.worker_id))]
    async fn process_job(&self, job: ScrapeJob) -> Result<ScrapeJob, WorkerError> {
        info!(urls = job.target_urls.len(), "Processing job");

        let lease = LeaseKeeper {
            queue: self.queue.as_ref(),
            worker_id: self.worker_id,
        };
        let finished = self.orchestrator.run_tracked(job, &lease).await?;
        let stored = self.queue.finish(&finished, self.worker_id).await?;

        info!(
            status = %stored.status,
            retries = stored.retry_count,
            pages = stored.pages_scraped,
            "Job finished"
        );
        Ok(stored)
    }
}

#[async_trait]
impl Worker for ScrapeWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!(worker_id = %self.worker_id, "Scrape worker started");

        loop {
            match self.process_next().await {
                Ok(Some(_)) => {}
                Ok(None) => sleep(self.idle_poll).await,
                Err(e) => {
                    error!(worker_id = %self.worker_id, error = %e, "Error processing job");
                    sleep(self.idle_poll).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
