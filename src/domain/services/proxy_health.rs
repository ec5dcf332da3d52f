// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::future::join_all;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::settings::ProxySettings;
use crate::domain::models::proxy::ProxyEndpoint;
use crate::domain::repositories::proxy_record_repository::ProxyRecordRepository;
use crate::domain::services::proxy_pool::ProxyPool;
use crate::engines::traits::{ScrapeRequest, ScraperEngine};

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// 一轮健康检查的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthCheckSummary {
    pub checked: usize,
    pub healthy: usize,
    /// 冷却中的代理不检查
    pub skipped: usize,
}

/// 代理健康检查
///
/// 通过每个代理请求 IP 回显地址，2xx 计为成功，结果写入代理池并持久化。
/// 冷却中的代理不参与检查，冷却只由时间结束。
pub struct ProxyHealthChecker {
    pool: Arc<ProxyPool>,
    engine: Arc<dyn ScraperEngine>,
    store: Arc<dyn ProxyRecordRepository>,
    check_url: String,
    timeout: Duration,
}

impl ProxyHealthChecker {
    pub fn new(
        pool: Arc<ProxyPool>,
        engine: Arc<dyn ScraperEngine>,
        store: Arc<dyn ProxyRecordRepository>,
        check_url: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            engine,
            store,
            check_url: check_url.into(),
            timeout: CHECK_TIMEOUT,
        }
    }

    pub fn from_settings(
        settings: &ProxySettings,
        pool: Arc<ProxyPool>,
        engine: Arc<dyn ScraperEngine>,
        store: Arc<dyn ProxyRecordRepository>,
    ) -> Self {
        Self::new(pool, engine, store, settings.health_check_url.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 经由代理请求回显地址，返回代理是否可用
    pub async fn check_proxy(&self, endpoint: &ProxyEndpoint) -> bool {
        let mut request = ScrapeRequest::new(self.check_url.as_str());
        request.timeout = self.timeout;
        request.proxy = Some(endpoint.clone());

        match self.engine.scrape(&request).await {
            Ok(response) if (200..300).contains(&response.status_code) => {
                debug!(proxy = %endpoint.id(), elapsed_ms = response.response_time_ms, "Proxy health check passed");
                true
            }
            Ok(response) => {
                debug!(proxy = %endpoint.id(), status = response.status_code, "Proxy health check rejected");
                false
            }
            Err(e) => {
                debug!(proxy = %endpoint.id(), error = %e, "Proxy health check failed");
                false
            }
        }
    }

    /// 并发检查所有未冷却的代理
    pub async fn check_all(&self) -> HealthCheckSummary {
        let total = self.pool.len();
        let available = self.pool.available();

        let results = join_all(available.iter().map(|record| async move {
            (record.id(), self.check_proxy(&record.endpoint).await)
        }))
        .await;

        let mut summary = HealthCheckSummary {
            checked: results.len(),
            skipped: total.saturating_sub(available.len()),
            ..Default::default()
        };
        for (id, healthy) in results {
            let updated = if healthy {
                summary.healthy += 1;
                counter!("proxy_health_checks_total", "result" => "healthy").increment(1);
                self.pool.record_success(&id)
            } else {
                counter!("proxy_health_checks_total", "result" => "unhealthy").increment(1);
                self.pool.record_failure(&id)
            };
            if let Some(record) = updated {
                if let Err(e) = self.store.upsert(&record).await {
                    warn!(proxy = %id, error = %e, "Failed to persist proxy record");
                }
            }
        }

        info!(
            healthy = summary.healthy,
            checked = summary.checked,
            skipped = summary.skipped,
            "Proxy health check complete"
        );
        summary
    }

    /// 按固定间隔在后台执行健康检查，首轮立即开始
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if self.pool.is_empty() {
                    continue;
                }
                self.check_all().await;
            }
        })
    }
}
