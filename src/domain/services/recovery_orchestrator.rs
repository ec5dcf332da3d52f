// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metrics::{counter, histogram};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::settings::ScrapingSettings;
use crate::domain::models::domain_health::DomainHealth;
use crate::domain::models::platform::Platform;
use crate::domain::models::product::ProductData;
use crate::domain::models::proxy::{ProxyEndpoint, ProxyRecord};
use crate::domain::models::scrape_job::{DomainError, JobStatus, ScrapeJob};
use crate::domain::models::scraped_page::{AttemptOutcome, AttemptRecord, ScrapedPage};
use crate::domain::repositories::domain_health_repository::DomainHealthRepository;
use crate::domain::repositories::proxy_record_repository::ProxyRecordRepository;
use crate::domain::repositories::scraped_page_repository::ScrapedPageRepository;
use crate::domain::services::anti_detection::{domain_of, AntiDetectionManager};
use crate::domain::services::block_detector::{detect_block, evasion_strategy, BlockSignal};
use crate::domain::services::extraction_service::{discover_product_links, extract, extract_generic};
use crate::domain::services::normalizer::quality_score;
use crate::domain::services::platform_detector::{detect_platform, detect_product_page, PlatformDetection};
use crate::domain::services::proxy_pool::ProxyPool;
use crate::domain::services::scrape_error::ScrapeError;
use crate::engines::router::EngineRouter;
use crate::engines::traits::{ScrapeRequest, ScrapeResponse};
use crate::engines::validators::{validate_domain_blacklist, validate_target_url};
use crate::utils::errors::RepositoryError;
use crate::utils::retry_policy::RetryPolicy;

/// 失败原因中最多列出的URL数
const MAX_REASON_ENTRIES: usize = 5;

/// 编排器错误
///
/// 抓取本身的失败不会出现在这里，它们体现在任务状态和页面记录中
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// 编排参数
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 视为成功的最低质量分
    pub quality_threshold: f64,
    /// 普通 HTTP 失败多少次后改用浏览器
    pub browser_after_failures: u32,
    /// 品牌/竞品模式下单个任务最多抓取的页面数
    pub max_pages_per_job: usize,
    pub request_timeout: Duration,
    pub blocked_domains: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 0.6,
            browser_after_failures: 2,
            max_pages_per_job: 20,
            request_timeout: Duration::from_secs(30),
            blocked_domains: Vec::new(),
        }
    }
}

impl From<&ScrapingSettings> for OrchestratorConfig {
    fn from(settings: &ScrapingSettings) -> Self {
        Self {
            quality_threshold: settings.quality_threshold,
            browser_after_failures: settings.browser_after_failures,
            max_pages_per_job: settings.max_pages_per_job,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            blocked_domains: settings.blocked_domains.clone(),
        }
    }
}

/// 编排器用到的存储
#[derive(Clone)]
pub struct OrchestratorStores {
    pub pages: Arc<dyn ScrapedPageRepository>,
    pub proxy_records: Arc<dyn ProxyRecordRepository>,
    pub domain_health: Arc<dyn DomainHealthRepository>,
}

/// 执行进度的回写点
///
/// 编排器在写入每个页面前、以及每次重试前调用，实现方负责持久化计数并续租。
/// 返回错误时编排器立即停止，任务交给新的租约持有者。
#[async_trait]
pub trait JobProgress: Send + Sync {
    async fn checkpoint(&self, job: &ScrapeJob) -> Result<(), RepositoryError>;
}

/// 不回写进度，用于没有租约的一次性执行
pub struct Untracked;

#[async_trait]
impl JobProgress for Untracked {
    async fn checkpoint(&self, _job: &ScrapeJob) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// 单个URL的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum UrlOutcome {
    /// 质量分达到阈值
    Succeeded,
    /// 重试预算用完
    Exhausted(String),
    /// 不可重试的错误
    Fatal(String),
    /// 入口列表页质量未达标，不重试
    Incomplete(String),
}

impl UrlOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UrlOutcome::Succeeded)
    }
}

/// 单个URL的抓取报告
#[derive(Debug)]
pub struct UrlReport {
    pub url: String,
    pub outcome: UrlOutcome,
    /// 已写入存储的页面
    pub page: ScrapedPage,
    html: Option<String>,
}

/// 单次成功获取的响应及其上下文
struct Fetched {
    response: ScrapeResponse,
    attempt: u32,
    delay_ms: f64,
    proxy: Option<String>,
}

/// 单个URL的状态机
enum UrlState {
    Fetch,
    Extract(Box<Fetched>),
    FallbackSelectors(Box<Fetched>, PlatformDetection),
    RotateAndRetry(BlockSignal),
    RetryWithBackoff,
    RetryLowQuality,
    Done(UrlOutcome),
}

/// 单个URL在多次尝试之间保留的状态
struct UrlRun<'a> {
    job_id: Uuid,
    url: &'a str,
    domain: String,
    attempt: u32,
    backoff_round: u32,
    http_failures: u32,
    use_browser: bool,
    excluded_proxies: Vec<String>,
    extra_delay_ms: u64,
    /// 品牌/竞品模式的入口页，低质量不重试
    listing: bool,
    attempts: Vec<AttemptRecord>,
    best: Option<(ScrapedPage, String)>,
    last_response: Option<ScrapedPage>,
    last_error: Option<String>,
}

impl<'a> UrlRun<'a> {
    fn new(job_id: Uuid, url: &'a str, listing: bool) -> Self {
        Self {
            job_id,
            url,
            domain: domain_of(url).unwrap_or_else(|| url.to_string()),
            attempt: 0,
            backoff_round: 0,
            http_failures: 0,
            use_browser: false,
            excluded_proxies: Vec::new(),
            extra_delay_ms: 0,
            listing,
            attempts: Vec::new(),
            best: None,
            last_response: None,
            last_error: None,
        }
    }

    fn record(
        &mut self,
        attempt: u32,
        engine: &str,
        proxy: Option<String>,
        delay_ms: f64,
        outcome: AttemptOutcome,
    ) {
        self.attempts.push(AttemptRecord {
            attempt,
            engine: engine.to_string(),
            proxy,
            delay_ms,
            outcome,
        });
    }

    /// 质量分更高的页面替换当前最佳页面
    fn offer(&mut self, page: ScrapedPage, html: String) {
        let better = self
            .best
            .as_ref()
            .map_or(true, |(best, _)| page.quality_score > best.quality_score);
        if better {
            self.best = Some((page, html));
        }
    }
}

/// 抓取恢复编排器
///
/// 对任务中的每个URL执行 fetch → extract 状态机：
///
/// ```text
/// fetch   → 成功      → extract
///         → 被拦截    → 轮换代理和身份后重试
///         → 网络错误  → 退避后重试
/// extract → 解析失败  → 通用选择器 → extract(generic)
/// ```
///
/// 每次重试都消耗任务的重试预算。至少一个URL达到质量阈值时任务成功。
pub struct RecoveryOrchestrator {
    router: Arc<EngineRouter>,
    anti_detection: Arc<AntiDetectionManager>,
    proxy_pool: Arc<ProxyPool>,
    stores: OrchestratorStores,
    retry_policy: RetryPolicy,
    config: OrchestratorConfig,
}

impl RecoveryOrchestrator {
    pub fn new(
        router: Arc<EngineRouter>,
        anti_detection: Arc<AntiDetectionManager>,
        proxy_pool: Arc<ProxyPool>,
        stores: OrchestratorStores,
        retry_policy: RetryPolicy,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            router,
            anti_detection,
            proxy_pool,
            stores,
            retry_policy,
            config,
        }
    }

    /// 执行一个 Running 状态的任务，不回写中间进度
    pub async fn run(&self, job: ScrapeJob) -> Result<ScrapeJob, OrchestratorError> {
        self.run_tracked(job, &Untracked).await
    }

    /// 执行一个 Running 状态的任务，返回进入终态的任务
    ///
    /// 每个URL恰好写入一条页面记录，包括质量分为 0 的页面
    #[instrument(skip(self, job, progress), fields(job_id = %job.id, mode = %job.mode))]
    pub async fn run_tracked(
        &self,
        mut job: ScrapeJob,
        progress: &dyn JobProgress,
    ) -> Result<ScrapeJob, OrchestratorError> {
        if job.status != JobStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: job.status,
                action: "run",
            }
            .into());
        }

        let mut queue: VecDeque<String> = job.target_urls.iter().cloned().collect();
        let mut seen: HashSet<String> = queue.iter().cloned().collect();
        let mut platforms: HashMap<String, Platform> = HashMap::new();
        let mut outcomes: Vec<(String, UrlOutcome)> = Vec::new();
        let mut discovered = false;

        while let Some(url) = queue.pop_front() {
            let listing = job.mode.discovers_links() && !discovered;
            let report = self
                .scrape_url(&mut job, &url, listing, &mut platforms, progress)
                .await?;
            job.record_pages(1)?;
            progress.checkpoint(&job).await?;
            self.stores.pages.save(&report.page).await?;

            if job.mode.discovers_links() && !discovered {
                discovered = true;
                if let Some(html) = &report.html {
                    let base = report.page.final_url.as_deref().unwrap_or(&url);
                    let budget = self.config.max_pages_per_job.saturating_sub(seen.len());
                    let links = discover_product_links(html, base, budget);
                    info!(count = links.len(), "Discovered product links");
                    for link in links {
                        if seen.insert(link.clone()) {
                            queue.push_back(link);
                        }
                    }
                }
            }

            outcomes.push((report.url, report.outcome));
        }

        let succeeded = outcomes.iter().filter(|(_, outcome)| outcome.is_success()).count();
        let job = if succeeded > 0 {
            info!(succeeded, total = outcomes.len(), retries = job.retry_count, "Job succeeded");
            counter!("scrape_jobs_total", "result" => "succeeded").increment(1);
            job.succeed()?
        } else {
            let reason = failure_reason(&outcomes, self.config.quality_threshold);
            warn!(reason = %reason, retries = job.retry_count, "Job failed");
            counter!("scrape_jobs_total", "result" => "failed").increment(1);
            job.fail(reason)?
        };
        Ok(job)
    }

    /// 抓取单个URL直到成功、预算耗尽或遇到致命错误
    ///
    /// `listing` 为 true 时该URL是用来发现商品链接的入口页
    #[instrument(skip(self, job, platforms, progress), fields(job_id = %job.id))]
    pub async fn scrape_url(
        &self,
        job: &mut ScrapeJob,
        url: &str,
        listing: bool,
        platforms: &mut HashMap<String, Platform>,
        progress: &dyn JobProgress,
    ) -> Result<UrlReport, OrchestratorError> {
        if let Err(e) = validate_target_url(url)
            .and_then(|_| validate_domain_blacklist(url, &self.config.blocked_domains))
        {
            warn!(url, error = %e, "Rejected target url");
            return Ok(UrlReport {
                url: url.to_string(),
                outcome: UrlOutcome::Fatal(e.to_string()),
                page: ScrapedPage::new(job.id, url),
                html: None,
            });
        }

        let mut run = UrlRun::new(job.id, url, listing);
        let mut state = UrlState::Fetch;

        let outcome = loop {
            state = match state {
                UrlState::Fetch => {
                    if run.attempt > 0 {
                        progress.checkpoint(job).await?;
                    }
                    let platform = platforms.get(&run.domain).copied().unwrap_or_default();
                    self.fetch(&mut run, platform).await
                }
                UrlState::Extract(fetched) => {
                    let detection = detect_platform(&fetched.response.content, &fetched.response.final_url);
                    platforms.insert(run.domain.clone(), detection.platform);
                    match extract(&fetched.response.content, &fetched.response.final_url, &detection) {
                        Ok(data) => self.evaluate(job, &mut run, *fetched, &detection, data, false),
                        Err(ScrapeError::Parse(reason)) => {
                            debug!(url, reason = %reason, "Falling back to generic selectors");
                            counter!("extraction_fallbacks_total", "platform" => detection.platform.as_str())
                                .increment(1);
                            UrlState::FallbackSelectors(fetched, detection)
                        }
                        Err(other) => UrlState::Done(UrlOutcome::Fatal(other.to_string())),
                    }
                }
                UrlState::FallbackSelectors(fetched, detection) => {
                    let data = extract_generic(&fetched.response.content, &fetched.response.final_url);
                    self.evaluate(job, &mut run, *fetched, &detection, data, true)
                }
                UrlState::RotateAndRetry(signal) => {
                    let strategy = evasion_strategy(&signal);
                    run.extra_delay_ms += strategy.extra_delay_ms;
                    if strategy.escalate_to_browser {
                        self.escalate(&mut run, "js_challenge");
                    }
                    self.note_http_failure(&mut run);
                    self.retry_or_exhaust(job, &run)
                }
                UrlState::RetryWithBackoff => {
                    self.note_http_failure(&mut run);
                    match self.retry_or_exhaust(job, &run) {
                        UrlState::Fetch => {
                            run.backoff_round += 1;
                            let backoff = self.retry_policy.calculate_backoff(run.backoff_round);
                            debug!(url, backoff_ms = backoff.as_millis() as u64, "Backing off");
                            sleep(backoff).await;
                            UrlState::Fetch
                        }
                        other => other,
                    }
                }
                UrlState::RetryLowQuality => {
                    self.note_http_failure(&mut run);
                    self.retry_or_exhaust(job, &run)
                }
                UrlState::Done(outcome) => break outcome,
            };
        };

        counter!(
            "scrape_urls_total",
            "result" => match &outcome {
                UrlOutcome::Succeeded => "succeeded",
                UrlOutcome::Exhausted(_) => "exhausted",
                UrlOutcome::Fatal(_) => "fatal",
                UrlOutcome::Incomplete(_) => "incomplete",
            }
        )
        .increment(1);

        let (mut page, html) = match run.best.take() {
            Some((page, html)) => (page, Some(html)),
            None => (
                run.last_response
                    .take()
                    .unwrap_or_else(|| ScrapedPage::new(job.id, url)),
                None,
            ),
        };
        page.attempts = std::mem::take(&mut run.attempts);

        Ok(UrlReport {
            url: url.to_string(),
            outcome,
            page,
            html,
        })
    }

    async fn fetch(&self, run: &mut UrlRun<'_>, platform: Platform) -> UrlState {
        run.attempt += 1;
        let attempt = run.attempt;

        let delay = self.anti_detection.compute_delay(&run.domain, platform)
            + Duration::from_millis(std::mem::take(&mut run.extra_delay_ms));
        let delay_ms = delay.as_secs_f64() * 1000.0;
        sleep(delay).await;

        let proxy = self.proxy_pool.acquire(&run.excluded_proxies);
        let proxy_id = proxy.as_ref().map(ProxyEndpoint::id);

        let mut request = ScrapeRequest::new(run.url);
        request.headers = self.anti_detection.identity();
        request.timeout = self.config.request_timeout;
        request.needs_js = run.use_browser;
        request.proxy = proxy;

        debug!(
            url = run.url,
            attempt,
            proxy = proxy_id.as_deref().unwrap_or("direct"),
            browser = run.use_browser,
            delay_ms,
            "Fetching"
        );

        match self.router.route(&request).await {
            Ok(response) => self.classify(run, response, attempt, delay_ms, proxy_id).await,
            Err(error) => {
                let error = ScrapeError::from(error);
                let engine = if run.use_browser { "browser" } else { "http" };
                run.record(
                    attempt,
                    engine,
                    proxy_id.clone(),
                    delay_ms,
                    AttemptOutcome::NetworkError {
                        message: error.to_string(),
                    },
                );
                run.last_error = Some(error.to_string());

                let health = self.anti_detection.record_failure(&run.domain, None);
                self.persist_health(&health).await;
                if let Some(record) = proxy_id.as_deref().and_then(|id| self.proxy_pool.record_failure(id)) {
                    self.persist_proxy(&record).await;
                }

                if error.is_retryable() {
                    warn!(url = run.url, attempt, error = %error, "Fetch failed");
                    UrlState::RetryWithBackoff
                } else {
                    warn!(url = run.url, attempt, error = %error, "Fetch failed permanently");
                    UrlState::Done(UrlOutcome::Fatal(error.to_string()))
                }
            }
        }
    }

    /// 按拦截信号和状态码对响应分类
    async fn classify(
        &self,
        run: &mut UrlRun<'_>,
        response: ScrapeResponse,
        attempt: u32,
        delay_ms: f64,
        proxy_id: Option<String>,
    ) -> UrlState {
        let status = response.status_code;
        let latency_ms = response.response_time_ms as f64;
        histogram!("scrape_response_time_ms", "engine" => response.engine).record(latency_ms);
        run.last_response = Some(unextracted_page(run.job_id, run.url, &response));

        if let Some(signal) = detect_block(
            status,
            &response.content,
            &response.headers,
            run.url,
            &response.final_url,
        ) {
            run.record(
                attempt,
                response.engine,
                proxy_id.clone(),
                delay_ms,
                AttemptOutcome::Blocked {
                    signal: signal.as_str(),
                },
            );
            run.last_error = Some(format!("blocked: {}", signal));

            let health = self.anti_detection.record_block(&run.domain, &signal);
            self.persist_health(&health).await;
            if let Some(id) = proxy_id {
                if let Some(record) = self.proxy_pool.record_block(&id) {
                    self.persist_proxy(&record).await;
                }
                run.excluded_proxies.push(id);
            }
            return UrlState::RotateAndRetry(signal);
        }

        match ScrapeError::from_status(status) {
            None => {
                let health = self.anti_detection.record_success(&run.domain, latency_ms);
                self.persist_health(&health).await;
                if let Some(record) = proxy_id.as_deref().and_then(|id| self.proxy_pool.record_success(id)) {
                    self.persist_proxy(&record).await;
                }
                UrlState::Extract(Box::new(Fetched {
                    response,
                    attempt,
                    delay_ms,
                    proxy: proxy_id,
                }))
            }
            Some(ScrapeError::FatalConfig(message)) => {
                run.record(
                    attempt,
                    response.engine,
                    proxy_id.clone(),
                    delay_ms,
                    AttemptOutcome::HttpError { status },
                );
                run.last_error = Some(message.clone());
                // 代理本身工作正常
                let health = self.anti_detection.record_failure(&run.domain, Some(latency_ms));
                self.persist_health(&health).await;
                if let Some(record) = proxy_id.as_deref().and_then(|id| self.proxy_pool.record_success(id)) {
                    self.persist_proxy(&record).await;
                }
                warn!(url = run.url, status, "Non-retryable HTTP status");
                UrlState::Done(UrlOutcome::Fatal(message))
            }
            Some(error) => {
                run.record(
                    attempt,
                    response.engine,
                    proxy_id.clone(),
                    delay_ms,
                    AttemptOutcome::NetworkError {
                        message: error.to_string(),
                    },
                );
                run.last_error = Some(error.to_string());
                let health = self.anti_detection.record_failure(&run.domain, Some(latency_ms));
                self.persist_health(&health).await;
                if let Some(record) = proxy_id.as_deref().and_then(|id| self.proxy_pool.record_failure(id)) {
                    self.persist_proxy(&record).await;
                }
                UrlState::RetryWithBackoff
            }
        }
    }

    /// 计算质量分并决定是否需要再次尝试
    fn evaluate(
        &self,
        job: &ScrapeJob,
        run: &mut UrlRun<'_>,
        fetched: Fetched,
        detection: &PlatformDetection,
        data: ProductData,
        fallback: bool,
    ) -> UrlState {
        let quality = quality_score(&data);
        let has_price = data.price.is_some();
        let response = &fetched.response;

        run.record(
            fetched.attempt,
            response.engine,
            fetched.proxy.clone(),
            fetched.delay_ms,
            AttemptOutcome::Extracted {
                quality_score: quality,
                fallback,
            },
        );
        histogram!("extraction_quality_score", "platform" => detection.platform.as_str()).record(quality);

        let product_page = detect_product_page(&response.content, &response.final_url);
        let mut page = unextracted_page(run.job_id, run.url, response);
        page.platform = detection.platform;
        page.platform_confidence = detection.confidence;
        page.is_product_page = product_page.is_product;
        page.fields = data;
        page.quality_score = quality;
        run.offer(page, fetched.response.content);

        let meets_threshold = quality >= self.config.quality_threshold;
        if meets_threshold && (has_price || !job.mode.requires_price()) {
            info!(
                url = run.url,
                platform = %detection.platform,
                quality,
                fallback,
                attempts = run.attempt,
                "Extraction succeeded"
            );
            return UrlState::Done(UrlOutcome::Succeeded);
        }

        run.last_error = Some(if meets_threshold {
            "no price found".to_string()
        } else {
            format!(
                "quality {:.2} below threshold {:.2}",
                quality, self.config.quality_threshold
            )
        });
        debug!(url = run.url, quality, "Low quality extraction");
        if run.listing {
            return UrlState::Done(UrlOutcome::Incomplete(
                run.last_error.clone().unwrap_or_default(),
            ));
        }
        UrlState::RetryLowQuality
    }

    /// 消耗一次重试预算，用完时结束当前URL
    fn retry_or_exhaust(&self, job: &mut ScrapeJob, run: &UrlRun<'_>) -> UrlState {
        match job.register_retry() {
            Ok(retry) => {
                counter!("scrape_retries_total").increment(1);
                debug!(url = run.url, retry, max_attempts = job.max_attempts, "Retrying");
                UrlState::Fetch
            }
            Err(_) => {
                let reason = run
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "retry budget exhausted".to_string());
                warn!(url = run.url, reason = %reason, "Retry budget exhausted");
                UrlState::Done(UrlOutcome::Exhausted(reason))
            }
        }
    }

    fn note_http_failure(&self, run: &mut UrlRun<'_>) {
        if run.use_browser {
            return;
        }
        run.http_failures += 1;
        if run.http_failures >= self.config.browser_after_failures {
            self.escalate(run, "repeated_failures");
        }
    }

    fn escalate(&self, run: &mut UrlRun<'_>, reason: &'static str) {
        if run.use_browser || !self.router.supports_js() {
            return;
        }
        run.use_browser = true;
        counter!("browser_escalations_total", "reason" => reason).increment(1);
        info!(url = run.url, reason, "Escalating to browser engine");
    }

    async fn persist_health(&self, health: &DomainHealth) {
        if let Err(e) = self.stores.domain_health.upsert(health).await {
            warn!(domain = %health.domain, error = %e, "Failed to persist domain health");
        }
    }

    async fn persist_proxy(&self, record: &ProxyRecord) {
        if let Err(e) = self.stores.proxy_records.upsert(record).await {
            warn!(proxy = %record.id(), error = %e, "Failed to persist proxy record");
        }
    }
}

/// 仅含响应元数据的页面
fn unextracted_page(job_id: Uuid, url: &str, response: &ScrapeResponse) -> ScrapedPage {
    let mut page = ScrapedPage::new(job_id, url);
    page.final_url = Some(response.final_url.clone());
    page.http_status = Some(response.status_code);
    page.content_hash = Some(ScrapedPage::hash_content(&response.content));
    page.fetched_with = Some(response.engine.to_string());
    page.response_time_ms = Some(response.response_time_ms);
    page
}

/// 面向用户的失败原因
fn failure_reason(outcomes: &[(String, UrlOutcome)], threshold: f64) -> String {
    let details: Vec<String> = outcomes
        .iter()
        .filter_map(|(url, outcome)| match outcome {
            UrlOutcome::Succeeded => None,
            UrlOutcome::Exhausted(reason)
            | UrlOutcome::Fatal(reason)
            | UrlOutcome::Incomplete(reason) => {
                Some(format!("{}: {}", url, reason))
            }
        })
        .take(MAX_REASON_ENTRIES)
        .collect();
    let mut reason = format!(
        "no url reached quality threshold {:.2} ({} tried)",
        threshold,
        outcomes.len()
    );
    if !details.is_empty() {
        reason.push_str("; ");
        reason.push_str(&details.join("; "));
    }
    reason
}

#[cfg(test)]
#[path = "recovery_orchestrator_test.rs"]
mod tests;
