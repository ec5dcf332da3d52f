// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::scrape_job::{JobStatus, ScrapeJob, ScrapeMode};
use crate::utils::errors::RepositoryError;

/// 任务列表查询条件
#[derive(Debug, Clone)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub mode: Option<ScrapeMode>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            status: None,
            mode: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// 抓取任务仓库特质
#[async_trait]
pub trait ScrapeJobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError>;
    /// 更新任务
    ///
    /// 数据库中已是终态的任务不允许再修改，返回 `Conflict`
    async fn update(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError>;
    /// 领取下一个可执行的任务并加租约
    ///
    /// 候选为 Queued 任务，以及租约已过期的 Running 任务，按创建时间先后
    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lease: chrono::Duration,
    ) -> Result<Option<ScrapeJob>, RepositoryError>;
    /// 续租并写回执行进度（`retry_count`、`pages_scraped`）
    ///
    /// 任务必须仍是 Running 且租约属于 `worker_id`，否则返回 `Conflict`
    async fn renew_lease(
        &self,
        job: &ScrapeJob,
        worker_id: Uuid,
        lease: chrono::Duration,
    ) -> Result<ScrapeJob, RepositoryError>;
    /// 由持有租约的 worker 写回终态任务
    ///
    /// 已是终态或租约已被其他 worker 接管时返回 `Conflict`
    async fn complete(&self, job: &ScrapeJob, worker_id: Uuid) -> Result<ScrapeJob, RepositoryError>;
    /// 按条件列出任务，新任务在前
    async fn list(&self, filter: JobFilter) -> Result<Vec<ScrapeJob>, RepositoryError>;
}
