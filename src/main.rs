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

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use viralscrape::config::settings::Settings;
use viralscrape::domain::repositories::{
    domain_health_repository::DomainHealthRepository, proxy_record_repository::ProxyRecordRepository,
    scrape_job_repository::ScrapeJobRepository, scraped_page_repository::ScrapedPageRepository,
};
use viralscrape::domain::services::anti_detection::AntiDetectionManager;
use viralscrape::domain::services::proxy_health::ProxyHealthChecker;
use viralscrape::domain::services::proxy_pool::ProxyPool;
use viralscrape::domain::services::proxy_provider::providers_from_settings;
use viralscrape::domain::services::recovery_orchestrator::{
    OrchestratorConfig, OrchestratorStores, RecoveryOrchestrator,
};
use viralscrape::engines::browser_engine::BrowserEngine;
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
use viralscrape::utils::clock::{Clock, SystemClock};
use viralscrape::utils::retry_policy::RetryPolicy;
use viralscrape::utils::telemetry;
use viralscrape::workers::manager::WorkerManager;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting viralscrape...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    viralscrape::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");
    connection::run_migrations(db.as_ref()).await?;

    // 4. Repositories
    let job_repo: Arc<dyn ScrapeJobRepository> = Arc::new(ScrapeJobRepositoryImpl::new(db.clone()));
    let page_repo: Arc<dyn ScrapedPageRepository> = Arc::new(ScrapedPageRepositoryImpl::new(db.clone()));
    let proxy_repo: Arc<dyn ProxyRecordRepository> = Arc::new(ProxyRecordRepositoryImpl::new(db.clone()));
    let health_repo: Arc<dyn DomainHealthRepository> =
        Arc::new(DomainHealthRepositoryImpl::new(db.clone()));

    // 5. Proxy pool and anti-detection state
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let proxy_pool = Arc::new(ProxyPool::from_settings(&settings.anti_detection, clock.clone()));
    for provider in providers_from_settings(&settings.proxies) {
        match provider.fetch_proxies().await {
            Ok(endpoints) => {
                let added = proxy_pool.add_endpoints(endpoints);
                info!(provider = provider.name(), added, "Loaded proxies");
            }
            Err(e) => warn!(provider = provider.name(), error = %e, "Failed to load proxies"),
        }
    }
    match proxy_repo.list().await {
        Ok(records) => proxy_pool.restore(records),
        Err(e) => warn!(error = %e, "Failed to restore proxy health"),
    }
    if settings.proxies.health_check_interval_secs > 0 && !proxy_pool.is_empty() {
        let checker = Arc::new(ProxyHealthChecker::from_settings(
            &settings.proxies,
            proxy_pool.clone(),
            Arc::new(ReqwestEngine::new()),
            proxy_repo.clone(),
        ));
        checker.spawn(Duration::from_secs(settings.proxies.health_check_interval_secs));
        info!(
            interval_secs = settings.proxies.health_check_interval_secs,
            "Proxy health checks scheduled"
        );
    }

    let anti_detection = Arc::new(AntiDetectionManager::new(
        settings.anti_detection.clone(),
        clock.clone(),
    ));
    match health_repo.list().await {
        Ok(records) => anti_detection.restore(records),
        Err(e) => warn!(error = %e, "Failed to restore domain health"),
    }

    // 6. Initialize Engines
    let mut engines: Vec<Arc<dyn ScraperEngine>> = vec![Arc::new(ReqwestEngine::new())];
    if settings.scraping.browser_enabled {
        engines.push(Arc::new(BrowserEngine));
    }
    let router = Arc::new(EngineRouter::new(engines));
    info!(engines = ?router.engine_names(), "Engines registered");

    let orchestrator = Arc::new(RecoveryOrchestrator::new(
        router,
        anti_detection.clone(),
        proxy_pool.clone(),
        OrchestratorStores {
            pages: page_repo.clone(),
            proxy_records: proxy_repo,
            domain_health: health_repo.clone(),
        },
        RetryPolicy::from(&settings.retry),
        OrchestratorConfig::from(&settings.scraping),
    ));

    // 7. Start Workers
    let lease = chrono::Duration::seconds(settings.scraping.lease_secs.max(1));
    let queue: Arc<dyn JobQueue> = Arc::new(DatabaseJobQueue::new(job_repo.clone(), lease));
    let mut worker_manager = WorkerManager::new(
        queue.clone(),
        orchestrator,
        Duration::from_millis(settings.scraping.idle_poll_ms),
    );
    worker_manager.start_workers(settings.scraping.concurrency);

    // 8. Start HTTP server
    let app = routes::app(AppContext {
        queue,
        jobs: job_repo,
        pages: page_repo,
        domain_health: health_repo,
        anti_detection,
        proxy_pool,
        scraping: Arc::new(settings.scraping.clone()),
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let server = axum::serve(listener, app).into_future();
    tokio::select! {
        result = server => result?,
        _ = worker_manager.wait_for_shutdown() => {}
    }

    Ok(())
}
