// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::setup_db;
use chrono::{Duration, Utc};
use std::sync::Arc;
use viralscrape::domain::models::proxy::{CooldownPolicy, ProxyEndpoint};
use viralscrape::domain::repositories::proxy_record_repository::ProxyRecordRepository;
use viralscrape::domain::services::proxy_health::{HealthCheckSummary, ProxyHealthChecker};
use viralscrape::domain::services::proxy_pool::ProxyPool;
use viralscrape::engines::reqwest_engine::ReqwestEngine;
use viralscrape::infrastructure::repositories::proxy_record_repo_impl::ProxyRecordRepositoryImpl;
use viralscrape::utils::clock::{Clock, ManualClock};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHECK_URL: &str = "http://ip-check.test/ip";

/// 绑定后立即释放的端口，连接会被拒绝
fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

struct Fixture {
    clock: Arc<ManualClock>,
    pool: Arc<ProxyPool>,
    store: Arc<ProxyRecordRepositoryImpl>,
    checker: ProxyHealthChecker,
}

async fn fixture(endpoints: Vec<ProxyEndpoint>) -> Fixture {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let pool = Arc::new(ProxyPool::new(clock.clone(), CooldownPolicy::default()));
    pool.add_endpoints(endpoints);
    let store = Arc::new(ProxyRecordRepositoryImpl::new(setup_db().await));
    let checker = ProxyHealthChecker::new(
        pool.clone(),
        Arc::new(ReqwestEngine::allow_private_network()),
        store.clone(),
        CHECK_URL,
    )
    .with_timeout(std::time::Duration::from_secs(2));
    Fixture {
        clock,
        pool,
        store,
        checker,
    }
}

#[tokio::test]
async fn test_health_check_cools_down_dead_proxy() {
    // 模拟服务器充当 HTTP 代理，回显请求
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"origin":"203.0.113.7"}"#))
        .mount(&proxy)
        .await;

    let live = ProxyEndpoint::new("127.0.0.1", proxy.address().port(), None);
    let dead = ProxyEndpoint::new("127.0.0.1", dead_port(), None);
    let app = fixture(vec![live.clone(), dead.clone()]).await;

    for _ in 0..3 {
        let summary = app.checker.check_all().await;
        assert_eq!(
            summary,
            HealthCheckSummary {
                checked: 2,
                healthy: 1,
                skipped: 0
            }
        );
    }

    let dead_record = app.pool.get(&dead.id()).unwrap();
    assert_eq!(dead_record.consecutive_failures, 3);
    assert!(!dead_record.is_available(app.clock.now()));
    assert_eq!(app.pool.get(&live.id()).unwrap().success_count, 3);

    // 冷却中的代理不再检查
    let summary = app.checker.check_all().await;
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.skipped, 1);

    let persisted = app.store.list().await.unwrap();
    let stored_dead = persisted.iter().find(|r| r.id() == dead.id()).unwrap();
    assert_eq!(stored_dead.failure_count, 3);
    assert!(stored_dead.cooldown_until.is_some());
    let stored_live = persisted.iter().find(|r| r.id() == live.id()).unwrap();
    assert_eq!(stored_live.success_count, 4);

    app.clock.advance(Duration::seconds(1801));
    assert_eq!(app.pool.available_count(), 2);
}

#[tokio::test]
async fn test_non_success_status_counts_as_failure() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(407))
        .expect(2)
        .mount(&proxy)
        .await;

    let endpoint = ProxyEndpoint::new("127.0.0.1", proxy.address().port(), None);
    let app = fixture(vec![endpoint.clone()]).await;

    assert!(!app.checker.check_proxy(&endpoint).await);

    let summary = app.checker.check_all().await;
    assert_eq!(summary.healthy, 0);
    let record = app.pool.get(&endpoint.id()).unwrap();
    assert_eq!(record.failure_count, 1);
    assert!(record.cooldown_until.is_none());
}
