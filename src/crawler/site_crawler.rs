//! Site crawler - breadth-first cache population
//!
//! This module contains the crawl loop that fills the current content store:
//! - Seeding the frontier with the site root
//! - Fetching each URL in the right mode (cors same-origin, no-cors otherwise)
//! - Storing cacheable responses
//! - Extracting and enqueueing links from same-origin HTML
//! - Writing the crawl marker when enabled

use crate::config::Config;
use crate::crawler::frontier::CrawlFrontier;
use crate::fetcher::{FetchMode, Fetcher};
use crate::http::Response;
use crate::links::LinkExtractor;
use crate::store::{self, CacheStorage, ContentStore};
use crate::url::{is_same_origin, parse_http_url, resolve_against, store_key};
use std::sync::Arc;
use url::Url;

/// Outcome of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Distinct URLs taken from the frontier
    pub visited: usize,
    /// Responses written to the store
    pub stored: usize,
    /// URLs whose fetch failed at the network level
    pub failed: usize,
    /// URLs added to the frontier by link discovery
    pub discovered: usize,
    /// True if the crawl stopped because it hit the visited ceiling
    pub ceiling_reached: bool,
}

/// Breadth-first crawler writing into the current content store
#[derive(Clone)]
pub struct SiteCrawler {
    config: Arc<Config>,
    origin: Url,
    caches: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
}

impl SiteCrawler {
    /// Creates a crawler for the site at `origin`
    pub fn new(
        config: Arc<Config>,
        origin: Url,
        caches: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Self {
        Self {
            config,
            origin,
            caches,
            fetcher,
            extractor,
        }
    }

    /// Absolute URL of the site root
    pub fn root_url(&self) -> Url {
        resolve_against(&self.origin, &self.config.shell.root).unwrap_or_else(|_| self.origin.clone())
    }

    /// Store key of the crawl marker, if markers are enabled
    pub fn marker_key(&self) -> Option<String> {
        if !self.config.crawler.use_crawl_marker {
            return None;
        }
        resolve_against(&self.origin, &self.config.crawler.marker_path)
            .ok()
            .map(|url| store_key(&url))
    }

    /// Returns true if a crawl already completed for the current version
    pub async fn has_completed(&self) -> bool {
        let Some(marker) = self.marker_key() else {
            return false;
        };
        let Some(cache) = store::open_quietly(self.caches.as_ref(), &self.config.cache_name()).await
        else {
            return false;
        };
        store::match_quietly(cache.as_ref(), &marker).await.is_some()
    }

    /// Crawls the whole site from its root with the configured ceiling
    pub async fn crawl_site(&self) -> CrawlReport {
        let root = self.root_url();
        self.crawl(&root, self.config.crawler.max_visited).await
    }

    /// Runs a breadth-first crawl from `root_url`
    ///
    /// Never fails: per-URL fetch, store and parse errors are logged and the crawl
    /// moves on. At most `max_visited` distinct URLs are fetched.
    pub async fn crawl(&self, root_url: &Url, max_visited: usize) -> CrawlReport {
        let mut report = CrawlReport::default();

        let cache_name = self.config.cache_name();
        let Some(cache) = store::open_quietly(self.caches.as_ref(), &cache_name).await else {
            return report;
        };

        tracing::info!("Starting crawl of {} (max {} URLs)", root_url, max_visited);
        let start_time = std::time::Instant::now();

        let mut frontier = CrawlFrontier::new(max_visited);
        frontier.push(root_url.clone());

        while let Some(url) = frontier.next_url() {
            report.visited += 1;
            tracing::debug!("Crawling {}", url);

            self.process_url(&url, cache.as_ref(), &mut frontier, &mut report)
                .await;

            if report.visited % 10 == 0 {
                tracing::info!(
                    "Progress: {} visited, {} stored, {} in frontier",
                    report.visited,
                    report.stored,
                    frontier.pending()
                );
            }
        }

        report.ceiling_reached = frontier.is_exhausted() && frontier.pending() > 0;
        if report.ceiling_reached {
            tracing::info!(
                "Crawl ceiling of {} reached with {} URLs still queued",
                max_visited,
                frontier.pending()
            );
        }

        // A crawl that stored nothing must not block later background crawls
        if let Some(marker) = self.marker_key() {
            if report.stored > 0 {
                let body = format!("crawl complete: {} urls visited", report.visited);
                let marker_response = Response::new(200)
                    .with_header("content-type", "text/plain")
                    .with_body(body);
                store::put_quietly(cache.as_ref(), &marker, &marker_response).await;
            } else {
                tracing::debug!("Crawl stored nothing, leaving marker unwritten");
            }
        }

        tracing::info!(
            "Crawl completed: {} visited, {} stored, {} failed in {:?}",
            report.visited,
            report.stored,
            report.failed,
            start_time.elapsed()
        );

        report
    }

    /// Fetches, stores and (for same-origin HTML) parses a single URL
    async fn process_url(
        &self,
        url: &Url,
        cache: &dyn ContentStore,
        frontier: &mut CrawlFrontier,
        report: &mut CrawlReport,
    ) {
        let same_origin = is_same_origin(&self.origin, url);

        let Some(response) = self.fetch_for_crawl(url, same_origin).await else {
            report.failed += 1;
            return;
        };

        if !response.is_cacheable() {
            tracing::debug!("Not storing {} (HTTP {})", url, response.status());
            return;
        }

        if store::put_quietly(cache, &store_key(url), &response).await {
            report.stored += 1;
        }

        if !same_origin || response.is_opaque() || !response.is_html() {
            return;
        }

        let Some(html) = response.text() else {
            return;
        };
        let links = self.extractor.extract_links(&html, url);
        report.discovered += self.handle_discovered_links(&links, frontier);
    }

    /// Fetches a URL the way the crawler is allowed to
    ///
    /// Same-origin URLs are fetched in cors mode and retried in no-cors mode if
    /// that fails; cross-origin URLs are only ever fetched no-cors (opaque).
    async fn fetch_for_crawl(&self, url: &Url, same_origin: bool) -> Option<Response> {
        if !same_origin {
            return match self.fetcher.fetch(url, FetchMode::NoCors).await {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::debug!("Opaque fetch failed for {}: {}", url, e);
                    None
                }
            };
        }

        match self.fetcher.fetch(url, FetchMode::Cors).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::debug!("Fetch failed for {}: {}, retrying without cors", url, e);
                match self.fetcher.fetch(url, FetchMode::NoCors).await {
                    Ok(response) => Some(response),
                    Err(e) => {
                        tracing::debug!("No-cors retry failed for {}: {}", url, e);
                        None
                    }
                }
            }
        }
    }

    /// Enqueues discovered links the crawl policy allows
    ///
    /// Returns the number of URLs added to the frontier.
    fn handle_discovered_links(&self, links: &[String], frontier: &mut CrawlFrontier) -> usize {
        let mut added = 0;

        for link in links {
            let url = match parse_http_url(link) {
                Ok(u) => u,
                Err(e) => {
                    tracing::debug!("Dropping discovered link {}: {}", link, e);
                    continue;
                }
            };

            if !is_same_origin(&self.origin, &url) && !self.config.crawler.crawl_cross_origin {
                continue;
            }

            if frontier.push(url) {
                added += 1;
            }
        }

        added
    }
}
