// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobStatus, ScrapeMode};
use crate::domain::repositories::scrape_job_repository::JobFilter;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建抓取任务请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateJobRequestDto {
    /// 目标URL列表
    #[validate(length(min = 1, max = 100))]
    pub urls: Vec<String>,

    /// 抓取模式
    #[serde(default)]
    pub mode: ScrapeMode,

    /// 重试预算，缺省使用配置值
    #[validate(range(min = 0, max = 20))]
    pub max_attempts: Option<i32>,
}

/// 任务列表查询参数
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct JobListQueryDto {
    pub status: Option<JobStatus>,
    pub mode: Option<ScrapeMode>,
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl From<&JobListQueryDto> for JobFilter {
    fn from(query: &JobListQueryDto) -> Self {
        let defaults = JobFilter::default();
        Self {
            status: query.status,
            mode: query.mode,
            limit: query.limit.unwrap_or(defaults.limit),
            offset: query.offset.unwrap_or(defaults.offset),
        }
    }
}
