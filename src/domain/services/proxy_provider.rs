// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::settings::ProxySettings;
use crate::domain::models::proxy::ProxyEndpoint;

/// 代理来源错误
#[derive(Error, Debug)]
pub enum ProxyProviderError {
    #[error("Proxy list request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Proxy list returned HTTP {0}")]
    Status(u16),
    #[error("Invalid proxy entry: {0}")]
    Invalid(String),
}

/// 代理来源
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// 获取当前可用的代理端点
    async fn fetch_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyProviderError>;

    fn name(&self) -> &'static str;
}

/// 配置文件中的静态代理列表
pub struct StaticProxyProvider {
    entries: Vec<String>,
}

impl StaticProxyProvider {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl ProxyProvider for StaticProxyProvider {
    /// 任一条目无效即报错，配置错误应在启动时暴露
    async fn fetch_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyProviderError> {
        self.entries
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                ProxyEndpoint::parse(entry).map_err(|e| ProxyProviderError::Invalid(e.to_string()))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// 从 URL 拉取代理列表，每行 `host:port[:user:pass]`
///
/// 空行和 `#` 注释行会被跳过，无法解析的行记录警告后丢弃
pub struct HttpProxyListProvider {
    url: String,
    client: reqwest::Client,
}

impl HttpProxyListProvider {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl ProxyProvider for HttpProxyListProvider {
    async fn fetch_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyProviderError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProxyProviderError::Status(status.as_u16()));
        }
        let body = response.text().await?;

        let mut endpoints = Vec::new();
        for line in body.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match ProxyEndpoint::parse(line) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(e) => warn!(error = %e, "Skipping invalid proxy entry"),
            }
        }

        info!(url = %self.url, count = endpoints.len(), "Fetched proxy list");
        Ok(endpoints)
    }

    fn name(&self) -> &'static str {
        "http_list"
    }
}

/// 根据配置创建代理来源
pub fn providers_from_settings(settings: &ProxySettings) -> Vec<Box<dyn ProxyProvider>> {
    let mut providers: Vec<Box<dyn ProxyProvider>> = Vec::new();
    if !settings.endpoints.is_empty() {
        providers.push(Box::new(StaticProxyProvider::new(settings.endpoints.clone())));
    }
    if let Some(url) = settings.provider_url.as_deref().filter(|url| !url.trim().is_empty()) {
        providers.push(Box::new(HttpProxyListProvider::new(url)));
    }
    providers
}
