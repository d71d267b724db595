//! Integration tests for the agent lifecycle and request interception

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tidepool::agent::{Agent, EventLifetime, ResponseSource};
use tidepool::config::{Config, RedirectPolicy};
use tidepool::fetcher::HttpFetcher;
use tidepool::http::{Destination, Request};
use tidepool::store::{CacheStorage, ContentStore, SqliteCacheStorage};
use tidepool::AgentState;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves the shell set and a small site
async fn start_site() -> MockServer {
    let mock_server = MockServer::start().await;

    for (page, body) in [
        ("/", r#"<html><body><a href="/about">About</a></body></html>"#),
        ("/index.html", "<html><body>entry page</body></html>"),
        ("/offline.html", "<html><body>offline page</body></html>"),
        ("/about", "<html><body>about page</body></html>"),
    ] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html"),
            )
            .mount(&mock_server)
            .await;
    }

    mock_server
}

fn build_agent(config: Config, caches: Arc<SqliteCacheStorage>) -> Agent {
    let origin = config.origin_url().expect("valid origin");
    let fetcher = HttpFetcher::from_config(&config.network, config.policy.redirects, &origin)
        .expect("Failed to build HTTP client");
    Agent::new(config, caches, Arc::new(fetcher)).expect("Failed to build agent")
}

fn page(base_url: &str, path: &str) -> Url {
    Url::parse(&format!("{}{}", base_url, path)).expect("valid URL")
}

#[tokio::test]
async fn test_install_and_activate_against_site() {
    let mock_server = start_site().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("tidepool.db");

    // A store left behind by an older version
    {
        let old = SqliteCacheStorage::new(&db_path).expect("Failed to open store");
        let mut old_config = Config::for_origin(&base_url);
        old_config.agent.version = "1.1".to_string();
        old.open(&old_config.cache_name()).await.expect("open old store");
    }

    let config = Config::for_origin(&base_url);
    let cache_name = config.cache_name();
    let caches = Arc::new(SqliteCacheStorage::new(&db_path).expect("Failed to open store"));
    let agent = build_agent(config, Arc::clone(&caches));

    let (installed, activated) = agent.start().await.expect("start agent");
    assert!(installed.shell_failed.is_empty());
    assert_eq!(installed.shell_cached.len(), 3);
    assert_eq!(installed.crawl.map(|c| c.visited), Some(2));
    assert_eq!(activated.deleted, vec!["unblocked-games-1.1".to_string()]);
    assert_eq!(agent.state(), AgentState::Activated);

    // Reopening the database sees the same single store
    drop(agent);
    drop(caches);
    let reopened = SqliteCacheStorage::new(&db_path).expect("Failed to reopen store");
    assert_eq!(reopened.keys().await.expect("list stores"), vec![cache_name.clone()]);

    let store = reopened.open(&cache_name).await.expect("open store");
    let keys = store.keys().await.expect("list keys");
    assert!(keys.contains(&format!("{}/about", base_url)));
    assert!(keys.contains(&format!("{}/offline.html", base_url)));
}

#[tokio::test]
async fn test_offline_navigation_served_from_cache() {
    let mock_server = start_site().await;
    let base_url = mock_server.uri();
    let mut config = Config::for_origin(&base_url);
    config.network.timeout_secs = 1;
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let agent = build_agent(config, caches);
    agent.start().await.expect("start agent");

    // The site stops answering in time
    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let lifetime = EventLifetime::new();
    let cached = agent
        .handle_fetch(&Request::navigate(page(&base_url, "/about")), &lifetime)
        .await;
    assert_eq!(cached.source(), Some(ResponseSource::Cache));
    let body = cached.response().and_then(|r| r.text()).unwrap_or_default();
    assert!(body.contains("about page"));

    let unknown = agent
        .handle_fetch(&Request::navigate(page(&base_url, "/never-seen")), &lifetime)
        .await;
    assert_eq!(unknown.source(), Some(ResponseSource::Fallback));
    let body = unknown.response().and_then(|r| r.text()).unwrap_or_default();
    assert!(body.contains("offline page"));

    let image = agent
        .handle_fetch(
            &Request::subresource(page(&base_url, "/img/missing.png"), Destination::Image),
            &lifetime,
        )
        .await;
    assert_eq!(
        image.response().and_then(|r| r.content_type()),
        Some("image/svg+xml")
    );

    lifetime.settled().await;
}

#[tokio::test]
async fn test_redirected_navigation_suppressed() {
    let mock_server = start_site().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    let mut config = Config::for_origin(&base_url);
    config.crawler.crawl_on_install = false;
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let agent = build_agent(config, caches);
    agent.start().await.expect("start agent");

    let lifetime = EventLifetime::new();
    let outcome = agent
        .handle_fetch(&Request::navigate(page(&base_url, "/old")), &lifetime)
        .await;
    let response = outcome.response().expect("a response");
    assert!(!response.is_redirect());
    assert_eq!(response.status(), 200);
    assert!(response.text().unwrap_or_default().contains("offline page"));

    lifetime.settled().await;
}

#[tokio::test]
async fn test_follow_policy_stores_final_response() {
    let mock_server = start_site().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/about"))
        .mount(&mock_server)
        .await;

    let mut config = Config::for_origin(&base_url);
    config.crawler.crawl_on_install = false;
    config.policy.redirects = RedirectPolicy::Follow;
    let cache_name = config.cache_name();
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let agent = build_agent(config, Arc::clone(&caches));
    agent.start().await.expect("start agent");

    let lifetime = EventLifetime::new();
    let outcome = agent
        .handle_fetch(&Request::navigate(page(&base_url, "/old")), &lifetime)
        .await;
    assert_eq!(outcome.source(), Some(ResponseSource::Network));
    assert!(outcome
        .response()
        .and_then(|r| r.text())
        .unwrap_or_default()
        .contains("about page"));

    let store = caches.open(&cache_name).await.expect("open store");
    let stored = store
        .match_url(&format!("{}/old", base_url))
        .await
        .expect("match");
    assert_eq!(stored.map(|r| r.status()), Some(200));
}

#[tokio::test]
async fn test_precache_message_against_site() {
    let mock_server = start_site().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1, 2, 3], "image/png"))
        .mount(&mock_server)
        .await;

    let mut config = Config::for_origin(&base_url);
    config.crawler.crawl_on_install = false;
    let cache_name = config.cache_name();
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let agent = build_agent(config, Arc::clone(&caches));
    agent.start().await.expect("start agent");

    let lifetime = EventLifetime::new();
    agent
        .handle_message(r#"{"type":"PRECACHE_URLS","urls":["/img/a.png"]}"#, &lifetime)
        .await;
    lifetime.settled().await;

    let store = caches.open(&cache_name).await.expect("open store");
    let stored = store
        .match_url(&format!("{}/img/a.png", base_url))
        .await
        .expect("match")
        .expect("image precached");
    // Same-origin no-cors responses stay readable
    assert!(!stored.is_opaque());
    assert_eq!(stored.status(), 200);
    assert_eq!(stored.content_type(), Some("image/png"));
    assert_eq!(stored.body().to_vec(), vec![1u8, 2, 3]);
}

#[tokio::test]
async fn test_precached_page_served_offline() {
    let mock_server = start_site().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/games/snake.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"<h1>snake</h1>".to_vec(), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let mut config = Config::for_origin(&base_url);
    config.crawler.crawl_on_install = false;
    config.network.timeout_secs = 1;
    let caches = Arc::new(SqliteCacheStorage::in_memory().expect("Failed to open store"));
    let agent = build_agent(config, caches);
    agent.start().await.expect("start agent");

    let lifetime = EventLifetime::new();
    agent
        .handle_message(r#"{"type":"PRECACHE_URLS","urls":["/games/snake.html"]}"#, &lifetime)
        .await;
    lifetime.settled().await;

    // The site stops answering in time
    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let outcome = agent
        .handle_fetch(&Request::navigate(page(&base_url, "/games/snake.html")), &lifetime)
        .await;
    assert_eq!(outcome.source(), Some(ResponseSource::Cache));
    let response = outcome.response().expect("a response");
    assert_eq!(response.status(), 200);
    assert!(!response.is_opaque());
    assert_eq!(response.content_type(), Some("text/html"));
    assert!(response.text().unwrap_or_default().contains("snake"));

    lifetime.settled().await;
}
