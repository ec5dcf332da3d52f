// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScrapingSettings;
use crate::domain::repositories::{
    domain_health_repository::DomainHealthRepository, scrape_job_repository::ScrapeJobRepository,
    scraped_page_repository::ScrapedPageRepository,
};
use crate::domain::services::{anti_detection::AntiDetectionManager, proxy_pool::ProxyPool};
use crate::presentation::handlers::{domain_handler, health_handler, job_handler, proxy_handler};
use crate::queue::job_queue::JobQueue;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 处理器共享的依赖
#[derive(Clone)]
pub struct AppContext {
    pub queue: Arc<dyn JobQueue>,
    pub jobs: Arc<dyn ScrapeJobRepository>,
    pub pages: Arc<dyn ScrapedPageRepository>,
    pub domain_health: Arc<dyn DomainHealthRepository>,
    pub anti_detection: Arc<AntiDetectionManager>,
    pub proxy_pool: Arc<ProxyPool>,
    pub scraping: Arc<ScrapingSettings>,
}

/// 创建应用路由
///
/// # 返回值
///
/// 返回未挂载依赖的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_handler::health_check))
        .route("/v1/version", get(health_handler::version));

    let job_routes = Router::new()
        .route("/v1/jobs", post(job_handler::create_job).get(job_handler::list_jobs))
        .route("/v1/jobs/{id}", get(job_handler::get_job))
        .route("/v1/jobs/{id}/pages", get(job_handler::get_job_pages))
        .route("/v1/jobs/{id}/retry", post(job_handler::retry_job));

    let status_routes = Router::new()
        .route("/v1/domains/{domain}", get(domain_handler::get_domain))
        .route("/v1/proxies", get(proxy_handler::list_proxies));

    Router::new()
        .merge(public_routes)
        .merge(job_routes)
        .merge(status_routes)
}

/// 挂载依赖和请求追踪后的完整应用
pub fn app(ctx: AppContext) -> Router {
    routes()
        .layer(Extension(ctx.queue))
        .layer(Extension(ctx.jobs))
        .layer(Extension(ctx.pages))
        .layer(Extension(ctx.domain_health))
        .layer(Extension(ctx.anti_detection))
        .layer(Extension(ctx.proxy_pool))
        .layer(Extension(ctx.scraping))
        .layer(TraceLayer::new_for_http())
}
