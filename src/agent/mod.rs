//! Offline agent
//!
//! [`Agent`] wires the configuration and the injected capabilities together:
//! - the lifecycle manager (`install` / `activate`)
//! - the request interceptor (`handle_fetch`)
//! - the control channel (`handle_message`)
//! - the connected client pages

mod clients;
mod fallback;
mod interceptor;
mod lifecycle;
mod lifetime;
mod messages;

pub use clients::{ClientId, Clients};
pub use fallback::{placeholder_image, service_unavailable, PLACEHOLDER_SVG};
pub use interceptor::{Interception, RequestInterceptor, ResponseSource};
pub use lifecycle::{ActivateReport, InstallReport};
pub use lifetime::EventLifetime;
pub use messages::{ControlMessage, StatusMessage};

use crate::config::Config;
use crate::crawler::SiteCrawler;
use crate::fetcher::{FetchMode, Fetcher};
use crate::http::Request;
use crate::links::{extractor_for, LinkExtractor};
use crate::output::{load_cache_status, CacheStatus};
use crate::state::AgentState;
use crate::store::{self, CacheStorage};
use crate::url::{resolve_against, store_key};
use crate::TidepoolError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// One version of the offline agent for one site
pub struct Agent {
    config: Arc<Config>,
    origin: Url,
    caches: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    crawler: SiteCrawler,
    interceptor: RequestInterceptor,
    clients: Clients,
    state: Mutex<AgentState>,
    waiting_skipped: AtomicBool,
}

impl Agent {
    /// Creates an agent using the configured link extractor
    pub fn new(
        config: Config,
        caches: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> crate::Result<Self> {
        let extractor = extractor_for(config.crawler.link_extractor);
        Self::with_extractor(config, caches, fetcher, extractor)
    }

    /// Creates an agent with an explicit link extractor
    pub fn with_extractor(
        config: Config,
        caches: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> crate::Result<Self> {
        let origin = config.origin_url()?;
        let config = Arc::new(config);

        let crawler = SiteCrawler::new(
            Arc::clone(&config),
            origin.clone(),
            Arc::clone(&caches),
            Arc::clone(&fetcher),
            extractor,
        );
        let interceptor = RequestInterceptor::new(
            Arc::clone(&config),
            origin.clone(),
            Arc::clone(&caches),
            Arc::clone(&fetcher),
            crawler.clone(),
        );

        Ok(Self {
            config,
            origin,
            caches,
            fetcher,
            crawler,
            interceptor,
            clients: Clients::new(),
            state: Mutex::new(AgentState::Parsed),
            waiting_skipped: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn caches(&self) -> &Arc<dyn CacheStorage> {
        &self.caches
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn crawler(&self) -> &SiteCrawler {
        &self.crawler
    }

    pub fn interceptor(&self) -> &RequestInterceptor {
        &self.interceptor
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Current lifecycle state
    pub fn state(&self) -> AgentState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// True once install asked to skip the graceful handover
    pub fn waiting_skipped(&self) -> bool {
        self.waiting_skipped.load(Ordering::SeqCst)
    }

    fn skip_waiting(&self) {
        self.waiting_skipped.store(true, Ordering::SeqCst);
    }

    fn transition(&self, next: AgentState) -> crate::Result<()> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        if !state.can_transition_to(next) {
            return Err(TidepoolError::InvalidTransition {
                from: *state,
                to: next,
            });
        }

        tracing::debug!("Agent state {} -> {}", *state, next);
        *state = next;
        Ok(())
    }

    /// Retires this agent; it stops intercepting
    pub fn retire(&self) -> crate::Result<()> {
        self.transition(AgentState::Redundant)
    }

    /// Answers an intercepted request
    ///
    /// Requests reaching an agent that is not yet active pass through.
    pub async fn handle_fetch(&self, request: &Request, lifetime: &EventLifetime) -> Interception {
        if !self.state().can_intercept() {
            return Interception::PassThrough;
        }
        self.interceptor.handle(request, lifetime).await
    }

    /// Handles a raw JSON control message from a client page
    ///
    /// Malformed and unknown messages are ignored.
    pub async fn handle_message(&self, raw: &str, lifetime: &EventLifetime) {
        match ControlMessage::from_json(raw) {
            Ok(message) => self.handle_control(message, lifetime).await,
            Err(e) => tracing::debug!("Ignoring control message: {}", e),
        }
    }

    pub async fn handle_control(&self, message: ControlMessage, lifetime: &EventLifetime) {
        match message {
            ControlMessage::PrecacheUrls { urls } => self.schedule_precache(urls, lifetime),
            ControlMessage::GetCacheStatus => {
                let status = self.cache_status().await;
                let delivered = self.clients.post_all(&status.to_message());
                tracing::debug!("Posted cache status ({} entries) to {} clients", status.count, delivered);
            }
        }
    }

    /// Snapshot of the current store, crawl marker excluded
    pub async fn cache_status(&self) -> CacheStatus {
        let cache_name = self.config.cache_name();
        let marker = self.crawler.marker_key();

        match load_cache_status(self.caches.as_ref(), &cache_name, marker.as_deref()).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Failed to read cache status: {}", e);
                CacheStatus {
                    cache_name,
                    ..Default::default()
                }
            }
        }
    }

    /// Fetches and stores `urls` in the background, best-effort per URL
    pub fn schedule_precache(&self, urls: Vec<String>, lifetime: &EventLifetime) {
        let origin = self.origin.clone();
        let caches = Arc::clone(&self.caches);
        let fetcher = Arc::clone(&self.fetcher);
        let cache_name = self.config.cache_name();

        lifetime.wait_until("precache", async move {
            precache(&origin, caches.as_ref(), fetcher.as_ref(), &cache_name, &urls).await;
        });
    }
}

/// Fetches each URL no-cors and stores ok or opaque responses
///
/// Returns the number of URLs stored.
pub async fn precache(
    origin: &Url,
    caches: &dyn CacheStorage,
    fetcher: &dyn Fetcher,
    cache_name: &str,
    urls: &[String],
) -> usize {
    let Some(cache) = store::open_quietly(caches, cache_name).await else {
        return 0;
    };

    let mut stored = 0;
    for raw in urls {
        let url = match resolve_against(origin, raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping precache URL {}: {}", raw, e);
                continue;
            }
        };

        match fetcher.fetch(&url, FetchMode::NoCors).await {
            Ok(response) if response.is_cacheable() => {
                if store::put_quietly(cache.as_ref(), &store_key(&url), &response).await {
                    stored += 1;
                }
            }
            Ok(response) => {
                tracing::debug!("Not precaching {} (HTTP {})", url, response.status());
            }
            Err(e) => tracing::debug!("Precache fetch failed for {}: {}", url, e),
        }
    }

    tracing::info!("Precached {} of {} URLs", stored, urls.len());
    stored
}
