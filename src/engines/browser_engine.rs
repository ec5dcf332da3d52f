// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, ScrapeRequest, ScrapeResponse, ScraperEngine};
use crate::engines::validators;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

// 共享浏览器实例，首次使用时启动
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

/// 获取或启动共享的浏览器实例
///
/// 设置了 `CHROMIUM_REMOTE_DEBUGGING_URL` 时连接远程 Chrome
async fn get_browser() -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let (browser, mut handler) =
                if let Ok(url) = std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL") {
                    tracing::info!(url = %url, "Connecting to remote Chrome instance");
                    Browser::connect(url).await.map_err(|e| {
                        EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let config = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(30))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage")
                        .arg("--disable-blink-features=AutomationControlled")
                        .build()
                        .map_err(EngineError::Browser)?;
                    Browser::launch(config)
                        .await
                        .map_err(|e| EngineError::Browser(e.to_string()))?
                };

            tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器引擎
///
/// 基于 chromiumoxide 的无头 Chromium 抓取，用于需要执行 JS 或
/// 纯 HTTP 请求被拦截后的升级路径
pub struct BrowserEngine;

#[async_trait]
impl ScraperEngine for BrowserEngine {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, EngineError> {
        validators::validate_url(&request.url)
            .await
            .map_err(|e| EngineError::Rejected(e.to_string()))?;

        if let Some(proxy) = &request.proxy {
            tracing::debug!(
                proxy = %proxy.id(),
                "Per-request proxies are not supported by the browser engine, going direct"
            );
        }

        let start = Instant::now();
        tokio::time::timeout(request.timeout, async {
            let browser = get_browser().await?;
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            if let Some(user_agent) = request
                .headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("user-agent"))
                .map(|(_, v)| v)
            {
                page.set_user_agent(user_agent.as_str())
                    .await
                    .map_err(|e| EngineError::Browser(e.to_string()))?;
            }

            page.goto(&request.url)
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            let content = page
                .content()
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;
            let final_url = page
                .url()
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| request.url.clone());

            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "Failed to close browser page");
            }

            Ok(ScrapeResponse {
                // CDP 导航不直接暴露状态码，拦截页由内容检测识别
                status_code: 200,
                content,
                final_url,
                content_type: "text/html".to_string(),
                headers: std::collections::HashMap::new(),
                response_time_ms: start.elapsed().as_millis() as u64,
                engine: self.name(),
            })
        })
        .await
        .map_err(|_| EngineError::Timeout)?
    }

    /// 只接受需要 JS 的请求
    fn support_score(&self, request: &ScrapeRequest) -> u8 {
        if request.needs_js {
            100
        } else {
            0
        }
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_score() {
        let engine = BrowserEngine;
        let mut request = ScrapeRequest::new("https://shop.example.com");
        assert_eq!(engine.support_score(&request), 0);
        request.needs_js = true;
        assert_eq!(engine.support_score(&request), 100);
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    async fn test_browser_renders_public_page() {
        let engine = BrowserEngine;
        let mut request = ScrapeRequest::new("https://example.com");
        request.needs_js = true;
        let response = engine.scrape(&request).await.unwrap();
        assert!(response.content.contains("Example Domain"));
    }
}
