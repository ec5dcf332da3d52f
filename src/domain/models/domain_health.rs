// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 滑动平均的平滑因子
pub const HEALTH_EWMA_ALPHA: f64 = 0.3;

/// 单次请求结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    /// 被拦截 (403/429/验证码/异常跳转)
    Blocked,
    /// 网络错误、5xx 或其他失败
    Failure,
}

/// 域名健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// 域名健康统计
///
/// 按域名滚动记录请求成功率和延迟，每次请求后更新。
/// 成功率和延迟都使用指数滑动平均，新域名从成功率 1.0 开始。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainHealth {
    pub domain: String,
    pub total_requests: i64,
    pub success_count: i64,
    pub failure_count: i64,
    pub blocked_count: i64,
    /// 近期成功率 [0, 1]
    pub success_rate: f64,
    /// 平均延迟（毫秒）
    pub avg_latency_ms: f64,
    pub consecutive_failures: i32,
    pub last_request_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DomainHealth {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            total_requests: 0,
            success_count: 0,
            failure_count: 0,
            blocked_count: 0,
            success_rate: 1.0,
            avg_latency_ms: 0.0,
            consecutive_failures: 0,
            last_request_at: None,
            updated_at: Utc::now(),
        }
    }

    /// 记录一次请求结果
    ///
    /// # 参数
    ///
    /// * `outcome` - 请求结果
    /// * `latency_ms` - 请求耗时，没有拿到响应时为 None
    /// * `now` - 当前时间
    pub fn record(&mut self, outcome: RequestOutcome, latency_ms: Option<f64>, now: DateTime<Utc>) {
        let hit = match outcome {
            RequestOutcome::Success => {
                self.success_count += 1;
                self.consecutive_failures = 0;
                1.0
            }
            RequestOutcome::Blocked => {
                self.failure_count += 1;
                self.blocked_count += 1;
                self.consecutive_failures += 1;
                0.0
            }
            RequestOutcome::Failure => {
                self.failure_count += 1;
                self.consecutive_failures += 1;
                0.0
            }
        };

        self.success_rate = self.success_rate * (1.0 - HEALTH_EWMA_ALPHA) + hit * HEALTH_EWMA_ALPHA;

        if let Some(latency) = latency_ms {
            self.avg_latency_ms = if self.total_requests == 0 {
                latency
            } else {
                self.avg_latency_ms * (1.0 - HEALTH_EWMA_ALPHA) + latency * HEALTH_EWMA_ALPHA
            };
        }

        self.total_requests += 1;
        self.last_request_at = Some(now);
        self.updated_at = now;
    }

    /// 近期失败率
    pub fn failure_rate(&self) -> f64 {
        (1.0 - self.success_rate).clamp(0.0, 1.0)
    }

    /// 被拦截请求占比
    pub fn block_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.blocked_count as f64 / self.total_requests as f64
        }
    }

    /// 健康分 [0, 1]
    pub fn health_score(&self) -> f64 {
        if self.total_requests == 0 {
            return 1.0;
        }
        let mut score: f64 = 1.0;
        if self.failure_rate() > 0.3 {
            score -= 0.4;
        }
        if self.avg_latency_ms > 20_000.0 {
            score -= 0.2;
        }
        if self.block_rate() > 0.2 {
            score -= 0.3;
        }
        score.max(0.0)
    }

    pub fn health_status(&self) -> HealthStatus {
        status_for_score(self.health_score())
    }
}

/// 健康分到状态的映射
pub fn status_for_score(score: f64) -> HealthStatus {
    if score >= 0.8 {
        HealthStatus::Healthy
    } else if score >= 0.6 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Unhealthy
    }
}
