// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 抓取任务实体
///
/// 表示一次抓取运行。状态只能向前推进：
/// Queued → Running → Succeeded/Failed。
/// 失败的任务不会被重新激活，显式重试会创建新的任务记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 抓取模式
    pub mode: ScrapeMode,
    /// 目标URL列表
    pub target_urls: Vec<String>,
    /// 任务状态
    pub status: JobStatus,
    /// 已消耗的重试次数
    pub retry_count: i32,
    /// 重试预算
    pub max_attempts: i32,
    /// 失败原因，仅在 Failed 状态下存在
    pub failure_reason: Option<String>,
    /// 由哪个失败任务重试而来
    pub retried_from: Option<Uuid>,
    /// 已写入的页面数
    pub pages_scraped: i32,
    /// 持有租约的 worker
    pub lock_token: Option<Uuid>,
    /// 租约过期时间
    pub lock_expires_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 抓取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeMode {
    /// 品牌官网，会从首页发现商品链接
    Brand,
    /// 单个或多个商品页
    #[default]
    Product,
    /// 竞品站点，行为同 Brand
    Competitor,
    /// 价格监控，成功还要求解析出价格
    Price,
}

impl ScrapeMode {
    /// 是否需要从入口页发现更多商品链接
    pub fn discovers_links(&self) -> bool {
        matches!(self, ScrapeMode::Brand | ScrapeMode::Competitor)
    }

    /// 成功是否要求有价格
    pub fn requires_price(&self) -> bool {
        matches!(self, ScrapeMode::Price)
    }
}

impl fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeMode::Brand => write!(f, "brand"),
            ScrapeMode::Product => write!(f, "product"),
            ScrapeMode::Competitor => write!(f, "competitor"),
            ScrapeMode::Price => write!(f, "price"),
        }
    }
}

impl FromStr for ScrapeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brand" => Ok(ScrapeMode::Brand),
            "product" => Ok(ScrapeMode::Product),
            "competitor" => Ok(ScrapeMode::Competitor),
            "price" => Ok(ScrapeMode::Price),
            _ => Err(()),
        }
    }
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已入队
    #[default]
    Queued,
    /// 执行中
    Running,
    /// 成功
    Succeeded,
    /// 失败
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} ({action})")]
    InvalidStateTransition { from: JobStatus, action: &'static str },

    /// 重试预算已用完
    #[error("Retry budget exhausted ({max_attempts} attempts)")]
    RetryBudgetExhausted { max_attempts: i32 },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ScrapeJob {
    /// 创建一个新的抓取任务
    ///
    /// # 参数
    ///
    /// * `mode` - 抓取模式
    /// * `target_urls` - 目标URL列表，不能为空
    /// * `max_attempts` - 重试预算，不能为负
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - Queued 状态的新任务
    /// * `Err(DomainError)` - 参数不合法
    pub fn new(
        mode: ScrapeMode,
        target_urls: Vec<String>,
        max_attempts: i32,
    ) -> Result<Self, DomainError> {
        if target_urls.is_empty() {
            return Err(DomainError::ValidationError(
                "at least one target url is required".to_string(),
            ));
        }
        if max_attempts < 0 {
            return Err(DomainError::ValidationError(
                "max_attempts cannot be negative".to_string(),
            ));
        }

        let now: DateTime<FixedOffset> = Utc::now().into();
        Ok(Self {
            id: Uuid::new_v4(),
            mode,
            target_urls,
            status: JobStatus::Queued,
            retry_count: 0,
            max_attempts,
            failure_reason: None,
            retried_from: None,
            pages_scraped: 0,
            lock_token: None,
            lock_expires_at: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        })
    }

    /// 启动任务，Queued → Running
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Queued => {
                let now = Utc::now().into();
                self.status = JobStatus::Running;
                self.started_at = Some(now);
                self.updated_at = now;
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                action: "start",
            }),
        }
    }

    /// 标记成功，Running → Succeeded
    pub fn succeed(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running => {
                let now = Utc::now().into();
                self.status = JobStatus::Succeeded;
                self.completed_at = Some(now);
                self.updated_at = now;
                self.release_lease();
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                action: "succeed",
            }),
        }
    }

    /// 标记失败，Running → Failed
    ///
    /// # 参数
    ///
    /// * `reason` - 面向用户的失败原因
    pub fn fail(mut self, reason: impl Into<String>) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Running => {
                let now = Utc::now().into();
                self.status = JobStatus::Failed;
                self.failure_reason = Some(reason.into());
                self.completed_at = Some(now);
                self.updated_at = now;
                self.release_lease();
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                action: "fail",
            }),
        }
    }

    /// 消耗一次重试
    ///
    /// 只能在 Running 状态下调用，计数永远不会超过 `max_attempts`
    pub fn register_retry(&mut self) -> Result<i32, DomainError> {
        if self.status != JobStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                action: "retry",
            });
        }
        if !self.can_retry() {
            return Err(DomainError::RetryBudgetExhausted {
                max_attempts: self.max_attempts,
            });
        }
        self.retry_count += 1;
        self.updated_at = Utc::now().into();
        Ok(self.retry_count)
    }

    /// 是否还有重试预算
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_attempts
    }

    /// 记录写入的页面数
    pub fn record_pages(&mut self, count: i32) -> Result<(), DomainError> {
        if self.status != JobStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                action: "record_pages",
            });
        }
        self.pages_scraped += count;
        self.updated_at = Utc::now().into();
        Ok(())
    }

    /// 基于失败任务创建新的重试任务
    ///
    /// 原任务保持 Failed 不变
    pub fn retry(&self) -> Result<ScrapeJob, DomainError> {
        if self.status != JobStatus::Failed {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                action: "retry_job",
            });
        }
        let mut job = ScrapeJob::new(self.mode, self.target_urls.clone(), self.max_attempts)?;
        job.retried_from = Some(self.id);
        Ok(job)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn release_lease(&mut self) {
        self.lock_token = None;
        self.lock_expires_at = None;
    }
}
