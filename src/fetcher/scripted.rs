//! Scripted in-process fetcher
//!
//! Answers fetches from a fixed route table instead of the network. Hosts use it
//! to replay a captured site; the test suites use it to drive every policy path
//! (offline, per-URL failures, redirects, opaque fetches) deterministically.

use crate::fetcher::traits::{FetchError, FetchMode, FetchResult, Fetcher};
use crate::http::Response;
use crate::url::store_key;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use url::Url;

/// A fetch the scripted fetcher has answered (or refused)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    pub url: String,
    pub mode: FetchMode,
}

/// Fetcher answering from a route table
///
/// Unknown URLs get a 404. Routes are keyed without their fragment. Without a
/// site origin every no-cors response is opaque.
#[derive(Default)]
pub struct ScriptedFetcher {
    site_origin: Option<Url>,
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    log: Mutex<Vec<FetchRecord>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher acting for the site at `origin`
    pub fn for_origin(origin: &str) -> Self {
        Self {
            site_origin: Url::parse(origin).ok(),
            ..Self::default()
        }
    }

    /// Serves `response` for `url`
    pub fn route(&self, url: &str, response: Response) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(key_for(url), response);
        }
    }

    /// Serves an HTML page for `url`
    pub fn html(&self, url: &str, body: &str) {
        self.route(
            url,
            Response::new(200)
                .with_header("content-type", "text/html; charset=utf-8")
                .with_body(body),
        );
    }

    /// Serves a redirect from `url` to `location`
    pub fn redirect(&self, url: &str, status: u16, location: &str) {
        self.route(url, Response::new(status).with_header("location", location));
    }

    /// Makes every fetch of `url` fail at the network level
    pub fn fail(&self, url: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(key_for(url));
        }
    }

    /// Simulates losing (or regaining) the network entirely
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every fetch made so far, in order
    pub fn requests(&self) -> Vec<FetchRecord> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Number of fetches made for `url`
    pub fn request_count(&self, url: &str) -> usize {
        let key = key_for(url);
        self.requests().iter().filter(|r| r.url == key).count()
    }
}

fn key_for(url: &str) -> String {
    Url::parse(url)
        .map(|u| store_key(&u))
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url, mode: FetchMode) -> FetchResult {
        let key = store_key(url);

        if let Ok(mut log) = self.log.lock() {
            log.push(FetchRecord {
                url: key.clone(),
                mode,
            });
        }

        let refused = self.offline.load(Ordering::SeqCst)
            || self
                .failing
                .lock()
                .map(|failing| failing.contains(&key))
                .unwrap_or(false);
        if refused {
            return Err(FetchError::Network {
                url: key,
                message: "network unreachable".to_string(),
            });
        }

        let response = self
            .routes
            .lock()
            .ok()
            .and_then(|routes| routes.get(&key).cloned())
            .unwrap_or_else(|| Response::new(404).with_header("content-type", "text/plain"));

        if mode.is_opaque_for(self.site_origin.as_ref(), url) {
            Ok(Response::opaque(response.body().to_vec()))
        } else {
            Ok(response)
        }
    }
}
