// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobStatus, ScrapeJob, ScrapeMode};
use crate::domain::models::scraped_page::ScrapedPage;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 创建任务响应DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateJobResponseDto {
    /// 请求处理是否成功
    pub success: bool,
    /// 新任务ID
    pub id: Uuid,
    pub status: JobStatus,
}

impl From<&ScrapeJob> for CreateJobResponseDto {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            success: true,
            id: job.id,
            status: job.status,
        }
    }
}

/// 任务详情DTO，不暴露租约字段
#[derive(Debug, Deserialize, Serialize)]
pub struct JobResponseDto {
    pub id: Uuid,
    pub mode: ScrapeMode,
    pub target_urls: Vec<String>,
    pub status: JobStatus,
    pub retry_count: i32,
    pub max_attempts: i32,
    pub failure_reason: Option<String>,
    pub retried_from: Option<Uuid>,
    pub pages_scraped: i32,
    pub created_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl From<ScrapeJob> for JobResponseDto {
    fn from(job: ScrapeJob) -> Self {
        Self {
            id: job.id,
            mode: job.mode,
            target_urls: job.target_urls,
            status: job.status,
            retry_count: job.retry_count,
            max_attempts: job.max_attempts,
            failure_reason: job.failure_reason,
            retried_from: job.retried_from,
            pages_scraped: job.pages_scraped,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// 任务列表响应DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct JobListResponseDto {
    pub success: bool,
    pub data: Vec<JobResponseDto>,
    pub limit: u64,
    pub offset: u64,
}

/// 任务页面列表响应DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct JobPagesResponseDto {
    pub success: bool,
    pub job_id: Uuid,
    pub data: Vec<ScrapedPage>,
}
