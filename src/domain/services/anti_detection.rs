// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use metrics::counter;
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::settings::AntiDetectionSettings;
use crate::domain::models::domain_health::{DomainHealth, RequestOutcome};
use crate::domain::models::platform::Platform;
use crate::domain::services::block_detector::BlockSignal;
use crate::utils::clock::Clock;

/// 桌面浏览器 UA 池
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.5; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9,en-US;q=0.8",
    "en-US,en;q=0.8,es;q=0.6",
    "en-CA,en;q=0.9,fr-CA;q=0.7",
];

const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://duckduckgo.com/",
];

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// 请求的主机名（小写），无法解析时返回 None
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
}

/// 生成一组随机但自洽的浏览器请求头
///
/// Chromium 系 UA 附带 `sec-ch-ua` 系列头，带 Referer 时 `Sec-Fetch-Site` 为 cross-site
pub fn random_identity(with_referer: bool) -> HashMap<String, String> {
    let mut rng = rand::rng();
    let user_agent = USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]);
    let language = ACCEPT_LANGUAGES
        .choose(&mut rng)
        .copied()
        .unwrap_or(ACCEPT_LANGUAGES[0]);
    let referer = if with_referer {
        REFERERS.choose(&mut rng).copied()
    } else {
        None
    };
    identity_headers(user_agent, language, referer)
}

fn identity_headers(user_agent: &str, language: &str, referer: Option<&str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), user_agent.to_string());
    headers.insert("Accept".to_string(), ACCEPT_HTML.to_string());
    headers.insert("Accept-Language".to_string(), language.to_string());
    headers.insert("Accept-Encoding".to_string(), "gzip, br".to_string());
    headers.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());
    headers.insert("Sec-Fetch-Dest".to_string(), "document".to_string());
    headers.insert("Sec-Fetch-Mode".to_string(), "navigate".to_string());
    headers.insert("Sec-Fetch-User".to_string(), "?1".to_string());
    headers.insert(
        "Sec-Fetch-Site".to_string(),
        if referer.is_some() { "cross-site" } else { "none" }.to_string(),
    );
    if let Some(referer) = referer {
        headers.insert("Referer".to_string(), referer.to_string());
    }

    if let Some(brands) = client_hint_brands(user_agent) {
        headers.insert("sec-ch-ua".to_string(), brands);
        headers.insert("sec-ch-ua-mobile".to_string(), "?0".to_string());
        headers.insert(
            "sec-ch-ua-platform".to_string(),
            format!("\"{}\"", ua_platform(user_agent)),
        );
    }

    headers
}

/// Chromium 系 UA 对应的 `sec-ch-ua`，其他浏览器不发送
fn client_hint_brands(user_agent: &str) -> Option<String> {
    let major = user_agent
        .split("Chrome/")
        .nth(1)?
        .split('.')
        .next()
        .filter(|major| !major.is_empty())?;
    let brand = if user_agent.contains("Edg/") {
        "Microsoft Edge"
    } else {
        "Google Chrome"
    };
    Some(format!(
        "\"Chromium\";v=\"{major}\", \"{brand}\";v=\"{major}\", \"Not-A.Brand\";v=\"99\""
    ))
}

fn ua_platform(user_agent: &str) -> &'static str {
    if user_agent.contains("Windows") {
        "Windows"
    } else if user_agent.contains("Macintosh") {
        "macOS"
    } else {
        "Linux"
    }
}

/// 反检测管理器
///
/// 维护各域名的健康统计，据此计算请求间隔，并为每个请求生成新的身份
pub struct AntiDetectionManager {
    settings: AntiDetectionSettings,
    health: DashMap<String, DomainHealth>,
    clock: Arc<dyn Clock>,
}

impl AntiDetectionManager {
    pub fn new(settings: AntiDetectionSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            health: DashMap::new(),
            clock,
        }
    }

    /// 当前请求使用的身份头，约一半请求带搜索引擎 Referer
    pub fn identity(&self) -> HashMap<String, String> {
        random_identity(rand::random_bool(0.5))
    }

    /// 请求间隔的确定性区间（毫秒）
    ///
    /// `[base_min · m, base_max · m]`，`m = 1 + failure_rate · factor`。
    /// 开启平台限速时下限不低于 `1000 / politeness`，两端都不超过 `max_delay_ms`。
    pub fn delay_bounds(&self, domain: &str, platform: Platform) -> (f64, f64) {
        let failure_rate = self
            .health
            .get(domain)
            .map(|health| health.failure_rate())
            .unwrap_or(0.0);
        let multiplier = 1.0 + failure_rate * self.settings.failure_delay_factor.max(0.0);

        let mut low = self.settings.base_delay_min_ms as f64 * multiplier;
        let mut high = (self.settings.base_delay_max_ms as f64 * multiplier).max(low);

        if self.settings.respect_platform_rate {
            let politeness = platform.politeness();
            if politeness > 0.0 {
                let floor = 1000.0 / politeness;
                low = low.max(floor);
                high = high.max(floor);
            }
        }

        let cap = self.settings.max_delay_ms as f64;
        (low.min(cap), high.min(cap))
    }

    /// 在区间内随机取样，偶尔追加一次长暂停
    pub fn compute_delay(&self, domain: &str, platform: Platform) -> Duration {
        let (low, high) = self.delay_bounds(domain, platform);
        let mut delay_ms = if high > low {
            rand::random_range(low..=high)
        } else {
            low
        };

        let probability = self.settings.long_pause_probability.clamp(0.0, 1.0);
        if probability > 0.0 && rand::random_bool(probability) {
            let (min, max) = (
                self.settings.long_pause_min_ms,
                self.settings.long_pause_max_ms.max(self.settings.long_pause_min_ms),
            );
            let pause = if max > min {
                rand::random_range(min..=max)
            } else {
                min
            };
            debug!(domain, pause_ms = pause, "Adding long pause");
            delay_ms = (delay_ms + pause as f64).min(self.settings.max_delay_ms as f64);
        }

        Duration::from_secs_f64(delay_ms.max(0.0) / 1000.0)
    }

    pub fn record_success(&self, domain: &str, latency_ms: f64) -> DomainHealth {
        self.record(domain, RequestOutcome::Success, Some(latency_ms))
    }

    pub fn record_failure(&self, domain: &str, latency_ms: Option<f64>) -> DomainHealth {
        self.record(domain, RequestOutcome::Failure, latency_ms)
    }

    pub fn record_block(&self, domain: &str, signal: &BlockSignal) -> DomainHealth {
        counter!("scrape_blocks_total", "signal" => signal.as_str()).increment(1);
        let health = self.record(domain, RequestOutcome::Blocked, None);
        warn!(
            domain,
            signal = %signal,
            failure_rate = health.failure_rate(),
            "Request blocked"
        );
        health
    }

    fn record(&self, domain: &str, outcome: RequestOutcome, latency_ms: Option<f64>) -> DomainHealth {
        let now = self.clock.now();
        let mut entry = self
            .health
            .entry(domain.to_string())
            .or_insert_with(|| DomainHealth::new(domain));
        entry.record(outcome, latency_ms, now);
        entry.clone()
    }

    pub fn health(&self, domain: &str) -> Option<DomainHealth> {
        self.health.get(domain).map(|health| health.clone())
    }

    /// 所有已跟踪域名的统计，按域名排序
    pub fn snapshot(&self) -> Vec<DomainHealth> {
        let mut all: Vec<DomainHealth> = self.health.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.domain.cmp(&b.domain));
        all
    }

    /// 载入持久化的域名统计，内存中已有的条目不覆盖
    pub fn restore(&self, records: impl IntoIterator<Item = DomainHealth>) {
        let mut restored = 0;
        for record in records {
            if !self.health.contains_key(&record.domain) {
                self.health.insert(record.domain.clone(), record);
                restored += 1;
            }
        }
        info!(restored, "Restored domain health");
    }
}
