// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::domain_health::{status_for_score, DomainHealth, HealthStatus};
use serde::{Deserialize, Serialize};

/// 系统健康响应DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponseDto {
    pub status: HealthStatus,
    /// 各域名健康分的平均值，没有数据时为 1.0
    pub health_score: f64,
    pub issues: Vec<String>,
    pub domains_tracked: usize,
}

impl HealthResponseDto {
    /// 汇总域名统计和代理池状态
    ///
    /// # 参数
    ///
    /// * `domains` - 已跟踪的域名统计
    /// * `proxies_total` - 代理池大小
    /// * `proxies_available` - 不在冷却中的代理数
    pub fn summarize(domains: &[DomainHealth], proxies_total: usize, proxies_available: usize) -> Self {
        let mut issues = Vec::new();
        let health_score = if domains.is_empty() {
            1.0
        } else {
            domains.iter().map(DomainHealth::health_score).sum::<f64>() / domains.len() as f64
        };

        for domain in domains {
            let status = domain.health_status();
            if status != HealthStatus::Healthy {
                issues.push(format!(
                    "domain {} is {:?} (score {:.2}, failure rate {:.2}, block rate {:.2})",
                    domain.domain,
                    status,
                    domain.health_score(),
                    domain.failure_rate(),
                    domain.block_rate()
                ));
            }
        }
        if proxies_total > 0 && proxies_available == 0 {
            issues.push(format!("all {} proxies are cooling down", proxies_total));
        }

        Self {
            status: status_for_score(health_score),
            health_score,
            issues,
            domains_tracked: domains.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::domain_health::RequestOutcome;
    use chrono::Utc;

    #[test]
    fn test_empty_system_is_healthy() {
        let health = HealthResponseDto::summarize(&[], 0, 0);
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.health_score, 1.0);
        assert!(health.issues.is_empty());
        assert_eq!(health.domains_tracked, 0);
    }

    #[test]
    fn test_blocked_domain_is_reported() {
        let mut blocked = DomainHealth::new("shop.example.com");
        for _ in 0..5 {
            blocked.record(RequestOutcome::Blocked, None, Utc::now());
        }
        let mut fine = DomainHealth::new("ok.example.com");
        fine.record(RequestOutcome::Success, Some(120.0), Utc::now());

        let health = HealthResponseDto::summarize(&[blocked, fine], 2, 0);
        assert_eq!(health.domains_tracked, 2);
        assert!(health.health_score < 1.0);
        assert_eq!(health.issues.len(), 2);
        assert!(health.issues[0].contains("shop.example.com"));
        assert!(health.issues[1].contains("proxies are cooling down"));
    }
}
