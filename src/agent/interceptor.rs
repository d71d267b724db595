//! Request interceptor - per-request caching policy
//!
//! Navigations are network-first with a cache fallback chain; every other GET is
//! cache-first with a background refresh. Non-GET requests are never touched.
//! Whatever happens on the network or in the store, a handled request always ends
//! in a response.

use crate::agent::fallback;
use crate::agent::lifetime::EventLifetime;
use crate::config::{Config, RedirectPolicy};
use crate::crawler::SiteCrawler;
use crate::fetcher::{FetchMode, Fetcher};
use crate::http::{Destination, Request, Response};
use crate::store::{self, CacheStorage, ContentStore};
use crate::url::{is_same_origin, resolve_against, store_key};
use reqwest::Method;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Where a response handed back to the page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// Synthesized, or a fallback asset standing in for the requested URL
    Fallback,
}

/// Outcome of intercepting one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// The host should perform the request itself
    PassThrough,
    Responded {
        response: Response,
        source: ResponseSource,
    },
}

impl Interception {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Interception::PassThrough => None,
            Interception::Responded { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Interception::PassThrough => None,
            Interception::Responded { source, .. } => Some(*source),
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Interception::PassThrough => None,
            Interception::Responded { response, .. } => Some(response),
        }
    }
}

fn responded(response: Response, source: ResponseSource) -> Interception {
    Interception::Responded { response, source }
}

/// Clears the background crawl flag when the crawl task ends, even by panic
struct CrawlGuard(Arc<AtomicBool>);

impl Drop for CrawlGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Policy engine answering intercepted requests
#[derive(Clone)]
pub struct RequestInterceptor {
    config: Arc<Config>,
    origin: Url,
    caches: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    crawler: SiteCrawler,
    crawl_in_flight: Arc<AtomicBool>,
}

impl RequestInterceptor {
    pub fn new(
        config: Arc<Config>,
        origin: Url,
        caches: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        crawler: SiteCrawler,
    ) -> Self {
        Self {
            config,
            origin,
            caches,
            fetcher,
            crawler,
            crawl_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a background crawl scheduled by this interceptor is running
    pub fn crawl_in_flight(&self) -> bool {
        self.crawl_in_flight.load(Ordering::SeqCst)
    }

    /// Handles one intercepted request
    ///
    /// Background work (refreshes, crawls) is registered on `lifetime` and never
    /// delays the returned response.
    pub async fn handle(&self, request: &Request, lifetime: &EventLifetime) -> Interception {
        if *request.method() != Method::GET {
            tracing::trace!("Passing through {} {}", request.method(), request.url());
            return Interception::PassThrough;
        }

        if request.is_navigation() {
            self.handle_navigation(request.url(), lifetime).await
        } else {
            self.handle_subresource(request, lifetime).await
        }
    }

    async fn handle_navigation(&self, url: &Url, lifetime: &EventLifetime) -> Interception {
        let key = store_key(url);
        let cache = self.current_store().await;

        match self.fetcher.fetch(url, self.mode_for(url)).await {
            Ok(response) if response.is_redirect() => match self.config.policy.redirects {
                RedirectPolicy::Store => {
                    if let Some(cache) = &cache {
                        store::put_quietly(cache.as_ref(), &key, &response).await;
                    }
                    responded(response, ResponseSource::Network)
                }
                RedirectPolicy::Suppress | RedirectPolicy::Follow => {
                    tracing::debug!(
                        "Suppressing HTTP {} redirect for navigation to {}",
                        response.status(),
                        url
                    );
                    self.schedule_crawl(lifetime);
                    self.navigation_fallback(cache.as_deref(), &key).await
                }
            },
            Ok(response) => {
                if response.is_cacheable() {
                    if let Some(cache) = &cache {
                        store::put_quietly(cache.as_ref(), &key, &response).await;
                    }
                }
                responded(response, ResponseSource::Network)
            }
            Err(e) => {
                tracing::info!("Navigation to {} failed ({}), serving from cache", url, e);
                self.schedule_crawl(lifetime);
                self.navigation_fallback(cache.as_deref(), &key).await
            }
        }
    }

    /// Requested URL, then the offline page, then the entry page, then a 503
    async fn navigation_fallback(&self, cache: Option<&dyn ContentStore>, key: &str) -> Interception {
        let Some(cache) = cache else {
            return responded(fallback::service_unavailable("offline"), ResponseSource::Fallback);
        };

        if let Some(hit) = store::match_quietly(cache, key).await {
            return responded(hit, ResponseSource::Cache);
        }

        for path in [&self.config.shell.offline_page, &self.config.shell.entry_page] {
            let Some(fallback_key) = self.shell_key(path) else {
                continue;
            };
            if let Some(hit) = store::match_quietly(cache, &fallback_key).await {
                tracing::debug!("Serving {} in place of {}", fallback_key, key);
                return responded(hit, ResponseSource::Fallback);
            }
        }

        responded(fallback::service_unavailable("offline"), ResponseSource::Fallback)
    }

    async fn handle_subresource(&self, request: &Request, lifetime: &EventLifetime) -> Interception {
        let url = request.url();
        let key = store_key(url);
        let cache = self.current_store().await;

        if let Some(cache) = &cache {
            if let Some(hit) = store::match_quietly(cache.as_ref(), &key).await {
                self.schedule_refresh(url.clone(), lifetime);
                self.schedule_crawl(lifetime);
                return responded(hit, ResponseSource::Cache);
            }
        }

        match self.fetcher.fetch(url, self.mode_for(url)).await {
            Ok(response) if response.is_redirect() => {
                tracing::debug!(
                    "Rejecting HTTP {} redirect for subresource {}",
                    response.status(),
                    url
                );
                if let Some(cache) = &cache {
                    if let Some(hit) = store::match_quietly(cache.as_ref(), &key).await {
                        return responded(hit, ResponseSource::Cache);
                    }
                }
                self.subresource_fallback(request.destination(), cache.as_deref())
                    .await
            }
            Ok(response) => {
                if response.is_cacheable() {
                    if let Some(cache) = &cache {
                        store::put_quietly(cache.as_ref(), &key, &response).await;
                    }
                }
                responded(response, ResponseSource::Network)
            }
            Err(e) => {
                tracing::debug!("Subresource {} unavailable: {}", url, e);
                self.subresource_fallback(request.destination(), cache.as_deref())
                    .await
            }
        }
    }

    async fn subresource_fallback(
        &self,
        destination: Destination,
        cache: Option<&dyn ContentStore>,
    ) -> Interception {
        match destination {
            Destination::Image => {
                responded(fallback::placeholder_image(), ResponseSource::Fallback)
            }
            Destination::Document => {
                if let (Some(cache), Some(offline_key)) =
                    (cache, self.shell_key(&self.config.shell.offline_page))
                {
                    if let Some(hit) = store::match_quietly(cache, &offline_key).await {
                        return responded(hit, ResponseSource::Fallback);
                    }
                }
                responded(fallback::service_unavailable("offline"), ResponseSource::Fallback)
            }
            _ => responded(fallback::service_unavailable(""), ResponseSource::Fallback),
        }
    }

    /// Re-fetches `url` in the background and stores the fresh copy
    fn schedule_refresh(&self, url: Url, lifetime: &EventLifetime) {
        let fetcher = Arc::clone(&self.fetcher);
        let caches = Arc::clone(&self.caches);
        let cache_name = self.config.cache_name();
        let mode = self.mode_for(&url);

        lifetime.wait_until("refresh", async move {
            match fetcher.fetch(&url, mode).await {
                Ok(response) if response.is_cacheable() => {
                    if let Some(cache) = store::open_quietly(caches.as_ref(), &cache_name).await {
                        store::put_quietly(cache.as_ref(), &store_key(&url), &response).await;
                    }
                }
                Ok(response) => {
                    tracing::debug!("Refresh of {} got HTTP {}", url, response.status());
                }
                Err(e) => tracing::debug!("Refresh of {} failed: {}", url, e),
            }
        });
    }

    /// Starts a background site crawl unless one is already running
    ///
    /// The crawl is skipped when the marker shows a completed crawl for this
    /// version.
    pub fn schedule_crawl(&self, lifetime: &EventLifetime) {
        if self.crawl_in_flight.swap(true, Ordering::SeqCst) {
            tracing::trace!("Background crawl already running");
            return;
        }

        let guard = CrawlGuard(Arc::clone(&self.crawl_in_flight));
        let crawler = self.crawler.clone();

        lifetime.wait_until("crawl", async move {
            let _guard = guard;
            if crawler.has_completed().await {
                tracing::debug!("Crawl marker present, skipping background crawl");
                return;
            }
            crawler.crawl_site().await;
        });
    }

    async fn current_store(&self) -> Option<Arc<dyn ContentStore>> {
        store::open_quietly(self.caches.as_ref(), &self.config.cache_name()).await
    }

    fn shell_key(&self, path: &str) -> Option<String> {
        resolve_against(&self.origin, path)
            .ok()
            .map(|url| store_key(&url))
    }

    fn mode_for(&self, url: &Url) -> FetchMode {
        if is_same_origin(&self.origin, url) {
            FetchMode::Cors
        } else {
            FetchMode::NoCors
        }
    }
}
