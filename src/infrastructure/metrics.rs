// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册指标说明。地址无效或端口被占用时只记录警告，
/// 指标宏在没有 recorder 时为空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(listen_addr = %settings.listen_addr, error = %e, "Invalid metrics address");
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(error = %e, "Failed to install Prometheus recorder");
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("scrape_jobs_total", "Jobs reaching a terminal state, by result");
    describe_counter!("scrape_urls_total", "Target URLs processed, by outcome");
    describe_counter!("scrape_retries_total", "Retries charged against job budgets");
    describe_counter!("scrape_blocks_total", "Blocked responses, by signal");
    describe_counter!("extraction_fallbacks_total", "Fallbacks to generic selectors, by platform");
    describe_counter!("browser_escalations_total", "Escalations to the browser engine, by reason");
    describe_counter!("engine_requests_total", "Engine requests, by engine and result");
    describe_histogram!("extraction_quality_score", "Data-quality score of extracted pages");
    describe_histogram!("scrape_response_time_ms", "Target response time in milliseconds");
    describe_gauge!("proxy_pool_available", "Proxies not in cooldown");
    describe_counter!("proxy_health_checks_total", "Proxy health checks, by result");

    describe_counter!(
        "circuit_breaker_failures_total",
        "Total number of failed requests recorded by circuit breaker"
    );
    describe_counter!(
        "circuit_breaker_successes_total",
        "Total number of successful requests recorded by circuit breaker"
    );
    describe_counter!(
        "circuit_breaker_rejected_total",
        "Total number of requests rejected by open circuit breaker"
    );
    describe_gauge!(
        "circuit_breaker_status",
        "Current status of circuit breaker (0=Closed, 0.5=HalfOpen, 1=Open)"
    );
}
