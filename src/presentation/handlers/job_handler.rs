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

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::dto::{
        job_request::{CreateJobRequestDto, JobListQueryDto},
        job_response::{CreateJobResponseDto, JobListResponseDto, JobPagesResponseDto, JobResponseDto},
    },
    config::settings::ScrapingSettings,
    domain::models::scrape_job::ScrapeJob,
    domain::repositories::{
        scrape_job_repository::{JobFilter, ScrapeJobRepository},
        scraped_page_repository::ScrapedPageRepository,
    },
    engines::validators::{validate_domain_blacklist, validate_target_url},
    presentation::errors::{ApiError, AppError},
    queue::job_queue::JobQueue,
};

/// 创建抓取任务
///
/// 校验URL后以 Queued 状态入队，返回 201
pub async fn create_job(
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    Extension(scraping): Extension<Arc<ScrapingSettings>>,
    Json(payload): Json<CreateJobRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(ApiError::from)?;

    let mut urls = Vec::with_capacity(payload.urls.len());
    for raw in &payload.urls {
        let url = validate_target_url(raw)
            .and_then(|url| validate_domain_blacklist(url.as_str(), &scraping.blocked_domains).map(|_| url))
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        urls.push(url.to_string());
    }

    let max_attempts = payload.max_attempts.unwrap_or(scraping.max_attempts);
    let job = ScrapeJob::new(payload.mode, urls, max_attempts)?;
    let job = queue.enqueue(job).await?;
    info!(job_id = %job.id, mode = %job.mode, urls = job.target_urls.len(), "Job enqueued");

    Ok((StatusCode::CREATED, Json(CreateJobResponseDto::from(&job))))
}

/// 分页列出任务，新任务在前
pub async fn list_jobs(
    Extension(repo): Extension<Arc<dyn ScrapeJobRepository>>,
    Query(query): Query<JobListQueryDto>,
) -> Result<Json<JobListResponseDto>, AppError> {
    query.validate().map_err(ApiError::from)?;
    let filter = JobFilter::from(&query);
    let (limit, offset) = (filter.limit, filter.offset);

    let jobs = repo.list(filter).await?;
    Ok(Json(JobListResponseDto {
        success: true,
        data: jobs.into_iter().map(JobResponseDto::from).collect(),
        limit,
        offset,
    }))
}

pub async fn get_job(
    Extension(repo): Extension<Arc<dyn ScrapeJobRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponseDto>, AppError> {
    let job = find_job(repo.as_ref(), id).await?;
    Ok(Json(job.into()))
}

/// 任务下已写入的页面
pub async fn get_job_pages(
    Extension(repo): Extension<Arc<dyn ScrapeJobRepository>>,
    Extension(pages): Extension<Arc<dyn ScrapedPageRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobPagesResponseDto>, AppError> {
    let job = find_job(repo.as_ref(), id).await?;
    let data = pages.find_by_job_id(job.id).await?;
    Ok(Json(JobPagesResponseDto {
        success: true,
        job_id: job.id,
        data,
    }))
}

/// 重试失败的任务
///
/// 原任务保持 Failed，新任务记录 `retried_from`。非 Failed 任务返回 409
pub async fn retry_job(
    Extension(repo): Extension<Arc<dyn ScrapeJobRepository>>,
    Extension(queue): Extension<Arc<dyn JobQueue>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let failed = find_job(repo.as_ref(), id).await?;
    let job = queue.enqueue(failed.retry()?).await?;
    info!(job_id = %job.id, retried_from = %failed.id, "Job retried");

    Ok((StatusCode::CREATED, Json(CreateJobResponseDto::from(&job))))
}

async fn find_job(repo: &dyn ScrapeJobRepository, id: Uuid) -> Result<ScrapeJob, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {}", id)).into())
}
