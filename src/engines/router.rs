// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::circuit_breaker::{CircuitBreaker, CircuitConfig};
use crate::engines::traits::{EngineError, ScrapeRequest, ScrapeResponse, ScraperEngine};
use metrics::counter;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 引擎性能统计
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// 成功率 (0.0 - 1.0)
    pub success_rate: f64,
    /// 平均响应时间
    pub avg_response_time: Duration,
    /// 使用次数
    pub usage_count: u64,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            avg_response_time: Duration::from_millis(500),
            usage_count: 0,
        }
    }
}

/// 引擎路由器
///
/// 根据请求的支持分数、熔断状态和历史表现选择抓取引擎，
/// 可重试的失败会顺延到下一个候选引擎
pub struct EngineRouter {
    engines: Vec<Arc<dyn ScraperEngine>>,
    circuit_breaker: Arc<CircuitBreaker>,
    engine_stats: RwLock<HashMap<&'static str, EngineStats>>,
}

impl EngineRouter {
    pub fn new(engines: Vec<Arc<dyn ScraperEngine>>) -> Self {
        Self::with_circuit_breaker(engines, Arc::new(CircuitBreaker::new(CircuitConfig::default())))
    }

    pub fn with_circuit_breaker(
        engines: Vec<Arc<dyn ScraperEngine>>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        let engine_stats = engines
            .iter()
            .map(|engine| (engine.name(), EngineStats::default()))
            .collect();

        Self {
            engines,
            circuit_breaker,
            engine_stats: RwLock::new(engine_stats),
        }
    }

    /// 已注册的引擎名
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// 是否注册了支持 JS 渲染的引擎
    pub fn supports_js(&self) -> bool {
        let mut js_request = ScrapeRequest::new("about:blank");
        js_request.needs_js = true;
        self.engines.iter().any(|e| e.support_score(&js_request) >= 50)
    }

    /// 按综合评分降序排列的候选引擎，跳过熔断中的引擎
    fn select_engines(&self, request: &ScrapeRequest) -> Vec<(f64, Arc<dyn ScraperEngine>)> {
        let stats = self.engine_stats.read();
        let default_stats = EngineStats::default();

        let mut candidates: Vec<(f64, Arc<dyn ScraperEngine>)> = self
            .engines
            .iter()
            .filter(|engine| !self.circuit_breaker.is_open(engine.name()))
            .filter_map(|engine| {
                let support = engine.support_score(request) as f64;
                if support == 0.0 {
                    return None;
                }
                let engine_stat = stats.get(engine.name()).unwrap_or(&default_stats);
                Some((calculate_engine_score(support, engine_stat), engine.clone()))
            })
            .collect();

        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    fn update_engine_stats(&self, engine_name: &'static str, success: bool, response_time: Duration) {
        let mut stats = self.engine_stats.write();
        let stat = stats.entry(engine_name).or_default();
        let alpha = 0.1;
        let current = if success { 1.0 } else { 0.0 };
        stat.success_rate = stat.success_rate * (1.0 - alpha) + current * alpha;

        let avg_ns = stat.avg_response_time.as_nanos() as f64;
        let sample_ns = response_time.as_nanos() as f64;
        stat.avg_response_time = Duration::from_nanos((avg_ns * (1.0 - alpha) + sample_ns * alpha) as u64);
        stat.usage_count += 1;
    }

    /// 路由请求到合适的引擎
    ///
    /// 非 2xx 响应也视为引擎成功返回，由调用方判断是否被拦截
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeResponse)` - 第一个成功返回的引擎响应
    /// * `Err(EngineError)` - 不可重试的错误或最后一个引擎的错误
    pub async fn route(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, EngineError> {
        let candidates = self.select_engines(request);
        if candidates.is_empty() {
            warn!(url = %request.url, "No suitable engines available for request");
            return Err(EngineError::AllEnginesFailed);
        }

        let mut last_error = None;
        for (score, engine) in candidates {
            let engine_name = engine.name();
            debug!(engine = engine_name, score, url = %request.url, "Trying engine");

            let started = Instant::now();
            match engine.scrape(request).await {
                Ok(response) => {
                    self.update_engine_stats(engine_name, true, started.elapsed());
                    self.circuit_breaker.record_success(engine_name);
                    counter!("engine_requests_total", "engine" => engine_name, "result" => "ok")
                        .increment(1);
                    return Ok(response);
                }
                Err(e) => {
                    self.update_engine_stats(engine_name, false, started.elapsed());
                    counter!("engine_requests_total", "engine" => engine_name, "result" => "error")
                        .increment(1);

                    if !e.is_retryable() {
                        warn!(engine = engine_name, error = %e, "Engine failed with non-retryable error");
                        return Err(e);
                    }
                    self.circuit_breaker.record_failure(engine_name);
                    warn!(engine = engine_name, error = %e, "Engine failed, trying next engine");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(EngineError::AllEnginesFailed))
    }

    pub fn engine_stats(&self) -> HashMap<&'static str, EngineStats> {
        self.engine_stats.read().clone()
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }
}

/// 综合评分：支持分数按成功率、响应时间和使用频率折算
fn calculate_engine_score(support_score: f64, stats: &EngineStats) -> f64 {
    let mut score = support_score;
    score *= 0.3 + stats.success_rate * 0.7;

    let response_time_score = 1.0 - (stats.avg_response_time.as_secs_f64() / 10.0).min(1.0);
    score *= 0.8 + response_time_score * 0.2;

    let usage_penalty = (stats.usage_count as f64 / 1000.0).min(0.1);
    score * (1.0 - usage_penalty)
}
