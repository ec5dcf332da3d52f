// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::services::block_detector::BlockSignal;
use crate::engines::traits::EngineError;

/// 抓取错误分类
///
/// 只有重试预算耗尽或致命错误才会让任务失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrapeError {
    /// 网络抖动、超时、5xx，退避后重试
    #[error("Transient network error: {0}")]
    TransientNetwork(String),
    /// 被目标站点拦截，轮换代理和身份后重试
    #[error("Blocked: {0}")]
    Blocked(BlockSignal),
    /// 选择器没有提取到任何关键字段，改用通用选择器
    #[error("Parse error: {0}")]
    Parse(String),
    /// 请求本身有问题（4xx、非法URL），不重试
    #[error("Fatal: {0}")]
    FatalConfig(String),
}

impl ScrapeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScrapeError::TransientNetwork(_) | ScrapeError::Blocked(_))
    }

    /// 用于指标和日志的类别名
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::TransientNetwork(_) => "transient_network",
            ScrapeError::Blocked(_) => "blocked",
            ScrapeError::Parse(_) => "parse",
            ScrapeError::FatalConfig(_) => "fatal_config",
        }
    }

    /// 根据 HTTP 状态码分类，2xx/3xx 返回 None
    ///
    /// 403/429 由拦截检测处理，这里只区分可重试的状态和致命状态
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=399 => None,
            403 => Some(ScrapeError::Blocked(BlockSignal::Http403)),
            429 => Some(ScrapeError::Blocked(BlockSignal::Http429)),
            408 | 500..=599 => Some(ScrapeError::TransientNetwork(format!("HTTP {}", status))),
            _ => Some(ScrapeError::FatalConfig(format!("HTTP {}", status))),
        }
    }
}

impl From<EngineError> for ScrapeError {
    fn from(error: EngineError) -> Self {
        match &error {
            EngineError::Rejected(reason) => ScrapeError::FatalConfig(reason.clone()),
            EngineError::Other(reason) => ScrapeError::FatalConfig(reason.clone()),
            _ if error.is_retryable() => ScrapeError::TransientNetwork(error.to_string()),
            EngineError::RequestFailed(e) if e.is_builder() => ScrapeError::FatalConfig(error.to_string()),
            _ => ScrapeError::TransientNetwork(error.to_string()),
        }
    }
}
