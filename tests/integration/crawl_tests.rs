//! Integration tests for the site crawler

use std::sync::Arc;
use tidepool::config::Config;
use tidepool::crawler::SiteCrawler;
use tidepool::fetcher::HttpFetcher;
use tidepool::links::extractor_for;
use tidepool::store::{CacheStorage, ContentStore, SqliteCacheStorage};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a crawler over `caches` for the site served by `server`
fn crawler_for(server: &MockServer, config: Config, caches: Arc<SqliteCacheStorage>) -> SiteCrawler {
    let config = Arc::new(config);
    let origin = Url::parse(&server.uri()).expect("mock server URI");
    let fetcher = HttpFetcher::from_config(&config.network, config.policy.redirects, &origin)
        .expect("Failed to build HTTP client");

    SiteCrawler::new(
        Arc::clone(&config),
        origin,
        caches,
        Arc::new(fetcher),
        extractor_for(config.crawler.link_extractor),
    )
}

async fn mount_html(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_into_sqlite() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/",
        r#"<html><body>
        <a href="/about">About</a>
        <img src="/img/logo.png">
        <a href="https://cdn.invalid/elsewhere.js">elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &mock_server,
        "/about",
        r#"<html><head><style>body { background: url('/img/bg.png'); }</style></head>
        <body><a href="/">Home</a></body></html>"#,
    )
    .await;
    for image in ["/img/logo.png", "/img/bg.png"] {
        Mock::given(method("GET"))
            .and(path(image))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50], "image/png"))
            .mount(&mock_server)
            .await;
    }

    let config = Config::for_origin(&base_url);
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let crawler = crawler_for(&mock_server, config.clone(), Arc::clone(&caches));

    let report = crawler.crawl_site().await;

    assert_eq!(report.visited, 4);
    assert_eq!(report.stored, 4);
    assert_eq!(report.failed, 0);
    assert!(!report.ceiling_reached);

    let store = caches.open(&config.cache_name()).await.expect("open store");
    let keys = store.keys().await.expect("list keys");
    assert_eq!(
        keys,
        vec![
            format!("{}/", base_url),
            format!("{}/about", base_url),
            format!("{}/img/bg.png", base_url),
            format!("{}/img/logo.png", base_url),
        ]
    );

    let about = store
        .match_url(&format!("{}/about", base_url))
        .await
        .expect("match")
        .expect("about page stored");
    assert_eq!(about.status(), 200);
    assert!(about.is_html());
}

#[tokio::test]
async fn test_crawl_stops_at_ceiling() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/", r#"<a href="/page0">next</a>"#).await;
    for i in 0..10 {
        mount_html(
            &mock_server,
            &format!("/page{}", i),
            &format!(r#"<a href="/page{}">next</a>"#, i + 1),
        )
        .await;
    }

    let mut config = Config::for_origin(&base_url);
    config.crawler.max_visited = 3;
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let crawler = crawler_for(&mock_server, config.clone(), Arc::clone(&caches));

    let report = crawler.crawl_site().await;

    assert_eq!(report.visited, 3);
    assert!(report.ceiling_reached);

    let requests = mock_server.received_requests().await.expect("request recording");
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_error_and_redirect_responses_not_stored() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/broken">broken</a> <a href="/moved">moved</a> <a href="/missing">missing</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .mount(&mock_server)
        .await;

    let config = Config::for_origin(&base_url);
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let crawler = crawler_for(&mock_server, config.clone(), Arc::clone(&caches));

    let report = crawler.crawl_site().await;
    assert_eq!(report.visited, 4);
    assert_eq!(report.stored, 1);

    let store = caches.open(&config.cache_name()).await.expect("open store");
    assert_eq!(store.keys().await.expect("list keys"), vec![format!("{}/", base_url)]);
}

#[tokio::test]
async fn test_crawl_marker_written() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/", "<p>only page</p>").await;

    let mut config = Config::for_origin(&mock_server.uri());
    config.crawler.use_crawl_marker = true;
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let crawler = crawler_for(&mock_server, config, caches);

    assert!(!crawler.has_completed().await);
    crawler.crawl_site().await;
    assert!(crawler.has_completed().await);
}
