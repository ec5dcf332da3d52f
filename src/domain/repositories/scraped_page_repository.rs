// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::scraped_page::ScrapedPage;
use crate::utils::errors::RepositoryError;

/// 抓取页面仓库特质
///
/// 页面写入后不可修改
#[async_trait]
pub trait ScrapedPageRepository: Send + Sync {
    async fn save(&self, page: &ScrapedPage) -> Result<ScrapedPage, RepositoryError>;
    /// 任务下的全部页面，按写入顺序
    async fn find_by_job_id(&self, job_id: Uuid) -> Result<Vec<ScrapedPage>, RepositoryError>;
}
