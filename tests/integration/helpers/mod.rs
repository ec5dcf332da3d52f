// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum_test::TestServer;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use viralscrape::config::settings::{AntiDetectionSettings, DatabaseSettings, ScrapingSettings};
use viralscrape::domain::models::proxy::CooldownPolicy;
use viralscrape::domain::services::anti_detection::AntiDetectionManager;
use viralscrape::domain::services::proxy_pool::ProxyPool;
use viralscrape::domain::services::recovery_orchestrator::{
    OrchestratorConfig, OrchestratorStores, RecoveryOrchestrator,
};
use viralscrape::engines::reqwest_engine::ReqwestEngine;
use viralscrape::engines::router::EngineRouter;
use viralscrape::engines::traits::ScraperEngine;
use viralscrape::infrastructure::database::connection;
use viralscrape::infrastructure::repositories::{
    domain_health_repo_impl::DomainHealthRepositoryImpl, proxy_record_repo_impl::ProxyRecordRepositoryImpl,
    scrape_job_repo_impl::ScrapeJobRepositoryImpl, scraped_page_repo_impl::ScrapedPageRepositoryImpl,
};
use viralscrape::presentation::routes::{self, AppContext};
use viralscrape::queue::job_queue::{DatabaseJobQueue, JobQueue};
use viralscrape::utils::clock::ManualClock;
use viralscrape::utils::retry_policy::RetryPolicy;

/// 一个已执行迁移的内存 SQLite 数据库
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: None,
        idle_timeout: None,
    };
    let db = connection::create_pool(&settings)
        .await
        .expect("Failed to open sqlite database");
    connection::run_migrations(&db)
        .await
        .expect("Failed to run migrations");
    Arc::new(db)
}

/// 请求间隔压到毫秒级的反检测配置
pub fn fast_anti_detection() -> AntiDetectionSettings {
    AntiDetectionSettings {
        base_delay_min_ms: 1,
        base_delay_max_ms: 2,
        max_delay_ms: 100,
        long_pause_probability: 0.0,
        respect_platform_rate: false,
        ..AntiDetectionSettings::default()
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub jobs: Arc<ScrapeJobRepositoryImpl>,
    pub pages: Arc<ScrapedPageRepositoryImpl>,
    pub domain_health: Arc<DomainHealthRepositoryImpl>,
    pub proxy_records: Arc<ProxyRecordRepositoryImpl>,
    pub queue: Arc<dyn JobQueue>,
    pub anti_detection: Arc<AntiDetectionManager>,
    pub proxy_pool: Arc<ProxyPool>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// 使用真实 HTTP 引擎的编排器，允许访问本地 mock 服务
    pub fn orchestrator(&self) -> Arc<RecoveryOrchestrator> {
        let engines: Vec<Arc<dyn ScraperEngine>> = vec![Arc::new(ReqwestEngine::allow_private_network())];
        Arc::new(RecoveryOrchestrator::new(
            Arc::new(EngineRouter::new(engines)),
            self.anti_detection.clone(),
            self.proxy_pool.clone(),
            OrchestratorStores {
                pages: self.pages.clone(),
                proxy_records: self.proxy_records.clone(),
                domain_health: self.domain_health.clone(),
            },
            RetryPolicy::immediate(),
            OrchestratorConfig::default(),
        ))
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_proxies(&[]).await
}

pub async fn create_test_app_with_proxies(proxies: &[&str]) -> TestApp {
    let db = setup_db().await;
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let jobs = Arc::new(ScrapeJobRepositoryImpl::new(db.clone()));
    let pages = Arc::new(ScrapedPageRepositoryImpl::new(db.clone()));
    let domain_health = Arc::new(DomainHealthRepositoryImpl::new(db.clone()));
    let proxy_records = Arc::new(ProxyRecordRepositoryImpl::new(db.clone()));
    let queue: Arc<dyn JobQueue> = Arc::new(DatabaseJobQueue::new(
        jobs.clone(),
        chrono::Duration::seconds(30),
    ));

    let proxy_pool = Arc::new(ProxyPool::new(clock.clone(), CooldownPolicy::default()));
    proxy_pool.add_endpoints(
        proxies
            .iter()
            .map(|raw| viralscrape::domain::models::proxy::ProxyEndpoint::parse(raw).expect("valid proxy")),
    );
    let anti_detection = Arc::new(AntiDetectionManager::new(fast_anti_detection(), clock.clone()));

    let scraping = ScrapingSettings {
        blocked_domains: vec!["blocked.example.com".to_string()],
        ..ScrapingSettings::default()
    };

    let app = routes::app(AppContext {
        queue: queue.clone(),
        jobs: jobs.clone(),
        pages: pages.clone(),
        domain_health: domain_health.clone(),
        anti_detection: anti_detection.clone(),
        proxy_pool: proxy_pool.clone(),
        scraping: Arc::new(scraping),
    });
    let server = TestServer::new(app).expect("Failed to start test server");

    TestApp {
        server,
        db,
        jobs,
        pages,
        domain_health,
        proxy_records,
        queue,
        anti_detection,
        proxy_pool,
        clock,
    }
}
