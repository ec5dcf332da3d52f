// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::create_test_app;
use std::time::Duration;
use uuid::Uuid;
use viralscrape::domain::models::platform::Platform;
use viralscrape::domain::models::scrape_job::{JobStatus, ScrapeJob, ScrapeMode};
use viralscrape::domain::models::scraped_page::AttemptOutcome;
use viralscrape::domain::repositories::domain_health_repository::DomainHealthRepository;
use viralscrape::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use viralscrape::domain::repositories::scraped_page_repository::ScrapedPageRepository;
use viralscrape::workers::scrape_worker::ScrapeWorker;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_PAGE: &str = r#"<html><head>
<script src="https://cdn.shopify.com/s/files/1/theme.js"></script>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Product",
  "name": "Walnut Serving Board",
  "description": "Solid walnut board finished with food-safe oil, large enough for a full cheese spread and slim enough to store upright in any kitchen cupboard.",
  "brand": {"@type": "Brand", "name": "Grain & Co"},
  "sku": "WB-12",
  "image": ["https://cdn.shopify.com/board-1.jpg", "https://cdn.shopify.com/board-2.jpg"],
  "offers": {"@type": "Offer", "price": "45.00", "priceCurrency": "USD", "availability": "https://schema.org/InStock"},
  "aggregateRating": {"@type": "AggregateRating", "ratingValue": "4.8", "reviewCount": "37"}
}
</script>
</head><body><div class="shopify-section"><h1 class="product-title">Walnut Serving Board</h1></div></body></html>"#;

const COLLECTION_PAGE: &str = r#"<html><head><script src="https://cdn.shopify.com/s/files/1/theme.js"></script></head>
<body><ul>
<li><a href="/products/board">Board</a></li>
<li><a href="/products/tray#reviews">Tray</a></li>
<li><a href="https://elsewhere.example.com/products/x">Elsewhere</a></li>
<li><a href="/pages/about">About</a></li>
</ul></body></html>"#;

fn html(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
}

async fn enqueue(app: &crate::helpers::TestApp, mode: ScrapeMode, urls: Vec<String>, max_attempts: i32) -> ScrapeJob {
    app.queue
        .enqueue(ScrapeJob::new(mode, urls, max_attempts).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_worker_scrapes_shopify_product_end_to_end() {
    let app = create_test_app().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/board"))
        .respond_with(html(200, PRODUCT_PAGE))
        .mount(&site)
        .await;

    let job = enqueue(
        &app,
        ScrapeMode::Product,
        vec![format!("{}/products/board", site.uri())],
        2,
    )
    .await;
    let worker = ScrapeWorker::new(app.queue.clone(), app.orchestrator(), Duration::from_millis(10));

    let finished = worker.process_next().await.unwrap().unwrap();
    assert_eq!(finished.id, job.id);
    assert_eq!(finished.status, JobStatus::Succeeded);
    assert_eq!(finished.pages_scraped, 1);
    assert_eq!(finished.retry_count, 0);

    let stored = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Succeeded);
    assert!(stored.lock_token.is_none());
    assert!(stored.completed_at.is_some());

    let pages = app.pages.find_by_job_id(job.id).await.unwrap();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.platform, Platform::Shopify);
    assert_eq!(page.http_status, Some(200));
    assert_eq!(page.fields.name.as_deref(), Some("Walnut Serving Board"));
    assert_eq!(page.fields.price, Some(45.0));
    assert!(page.quality_score > 0.6);
    assert_eq!(page.fetched_with.as_deref(), Some("reqwest"));
    assert!(page.content_hash.is_some());

    let health = app.domain_health.find_by_domain("127.0.0.1").await.unwrap().unwrap();
    assert_eq!(health.success_count, 1);

    // 队列已空
    assert!(worker.process_next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_worker_retries_through_blocks() {
    let app = create_test_app().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/board"))
        .respond_with(html(403, "<html><body>Nope</body></html>"))
        .up_to_n_times(2)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/board"))
        .respond_with(html(200, PRODUCT_PAGE))
        .mount(&site)
        .await;

    let job = enqueue(
        &app,
        ScrapeMode::Price,
        vec![format!("{}/products/board", site.uri())],
        3,
    )
    .await;
    let worker = ScrapeWorker::new(app.queue.clone(), app.orchestrator(), Duration::from_millis(10));

    let finished = worker.process_next().await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Succeeded);
    assert_eq!(finished.retry_count, 2);

    let pages = app.pages.find_by_job_id(job.id).await.unwrap();
    assert_eq!(pages.len(), 1);
    let blocked = pages[0]
        .attempts
        .iter()
        .filter(|attempt| matches!(attempt.outcome, AttemptOutcome::Blocked { .. }))
        .count();
    assert_eq!(blocked, 2);
    assert_eq!(pages[0].attempts.len(), 3);

    let health = app.anti_detection.health("127.0.0.1").unwrap();
    assert_eq!(health.blocked_count, 2);
    assert_eq!(health.success_count, 1);
}

#[tokio::test]
async fn test_worker_fails_job_on_missing_page() {
    let app = create_test_app().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(404, "<html><body>Not here</body></html>"))
        .mount(&site)
        .await;

    let job = enqueue(
        &app,
        ScrapeMode::Product,
        vec![format!("{}/products/gone", site.uri())],
        3,
    )
    .await;
    let worker = ScrapeWorker::new(app.queue.clone(), app.orchestrator(), Duration::from_millis(10));

    let finished = worker.process_next().await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.retry_count, 0);
    let reason = finished.failure_reason.unwrap();
    assert!(reason.contains("HTTP 404"), "unexpected reason: {}", reason);

    // 失败的页面同样被记录
    let pages = app.pages.find_by_job_id(job.id).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].quality_score, 0.0);
    assert_eq!(pages[0].http_status, Some(404));
}

#[tokio::test]
async fn test_worker_discovers_products_in_brand_mode() {
    let app = create_test_app().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(200, COLLECTION_PAGE))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/board"))
        .respond_with(html(200, PRODUCT_PAGE))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/tray"))
        .respond_with(html(200, PRODUCT_PAGE))
        .mount(&site)
        .await;

    let job = enqueue(
        &app,
        ScrapeMode::Brand,
        vec![format!("{}/collections/all", site.uri())],
        2,
    )
    .await;
    let worker = ScrapeWorker::new(app.queue.clone(), app.orchestrator(), Duration::from_millis(10));

    let finished = worker.process_next().await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Succeeded);
    assert_eq!(finished.pages_scraped, 3);

    let pages = app.pages.find_by_job_id(job.id).await.unwrap();
    let urls: Vec<&str> = pages.iter().map(|page| page.url.as_str()).collect();
    assert_eq!(urls.len(), 3);
    assert!(urls[0].ends_with("/collections/all"));
    assert!(urls.iter().any(|url| url.ends_with("/products/board")));
    assert!(urls.iter().any(|url| url.ends_with("/products/tray")));
    assert!(!urls.iter().any(|url| url.contains("elsewhere")));
}

#[tokio::test]
async fn test_finished_job_cannot_be_acquired_again() {
    let app = create_test_app().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(200, PRODUCT_PAGE))
        .mount(&site)
        .await;

    enqueue(&app, ScrapeMode::Product, vec![format!("{}/products/board", site.uri())], 1).await;
    let worker = ScrapeWorker::new(app.queue.clone(), app.orchestrator(), Duration::from_millis(10));
    let finished = worker.process_next().await.unwrap().unwrap();
    assert!(finished.is_terminal());

    assert!(app.queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
    let err = app.queue.finish(&finished, worker.worker_id()).await.unwrap_err();
    assert!(err.to_string().contains("already"));
}
