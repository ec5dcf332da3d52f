// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engines::traits::{EngineError, ScrapeRequest, ScrapeResponse, ScraperEngine};
use crate::engines::validators;
use crate::utils::text_encoding::decode_body;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Instant;

/// 抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎
pub struct ReqwestEngine {
    /// 是否拒绝解析到内网地址的URL
    ssrf_protection: bool,
}

impl Default for ReqwestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestEngine {
    pub fn new() -> Self {
        Self {
            ssrf_protection: true,
        }
    }

    /// 允许访问内网地址，仅用于本地测试
    pub fn allow_private_network() -> Self {
        Self {
            ssrf_protection: false,
        }
    }
}

#[async_trait]
impl ScraperEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeResponse)` - 抓取响应，包括非 2xx 状态
    /// * `Err(EngineError)` - 网络层错误
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, EngineError> {
        if self.ssrf_protection {
            validators::validate_url(&request.url)
                .await
                .map_err(|e| EngineError::Rejected(e.to_string()))?;
        }

        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }

        // Each request gets a fresh client for cookie isolation
        let mut builder = reqwest::Client::builder()
            .timeout(request.timeout)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(endpoint) = &request.proxy {
            let mut proxy = reqwest::Proxy::all(endpoint.proxy_url())
                .map_err(|e| EngineError::Other(format!("Invalid proxy: {}", e)))?;
            if let Some(credentials) = &endpoint.credentials {
                proxy = proxy.basic_auth(&credentials.username, &credentials.password);
            }
            builder = builder.proxy(proxy);
        } else {
            builder = builder.no_proxy();
        }

        let client = builder.build()?;

        let start = Instant::now();
        let response = client.get(&request.url).headers(headers).send().await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("text/html")
            .to_string();

        let mut response_headers = std::collections::HashMap::new();
        for (k, v) in response.headers() {
            if let Ok(v_str) = v.to_str() {
                response_headers.insert(k.as_str().to_string(), v_str.to_string());
            }
        }

        let bytes = response.bytes().await?;
        let content = decode_body(&bytes, Some(&content_type));

        Ok(ScrapeResponse {
            status_code,
            content,
            final_url,
            content_type,
            headers: response_headers,
            response_time_ms: start.elapsed().as_millis() as u64,
            engine: self.name(),
        })
    }

    /// 计算对请求的支持分数
    ///
    /// 不需要JS的请求返回100分
    fn support_score(&self, request: &ScrapeRequest) -> u8 {
        if request.needs_js {
            return 10;
        }
        100
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
