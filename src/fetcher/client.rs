//! HTTP fetcher implementation
//!
//! This module reaches the real network through reqwest:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Choosing the redirect policy (manual by default, so 3xx reach the policy code)
//! - Converting reqwest responses into [`Response`] snapshots
//! - Classifying transport errors

use crate::config::{NetworkConfig, RedirectPolicy};
use crate::fetcher::traits::{FetchError, FetchMode, FetchResult, Fetcher};
use crate::http::{Headers, Response};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops when the fetcher follows redirects itself
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The network configuration
/// * `redirects` - The redirect policy; only `Follow` lets reqwest chase 3xx
///
/// # Example
///
/// ```no_run
/// use tidepool::config::{NetworkConfig, RedirectPolicy};
/// use tidepool::fetcher::build_http_client;
///
/// let client = build_http_client(&NetworkConfig::default(), RedirectPolicy::Suppress).unwrap();
/// ```
pub fn build_http_client(
    config: &NetworkConfig,
    redirects: RedirectPolicy,
) -> Result<Client, reqwest::Error> {
    let redirect_policy = match redirects {
        RedirectPolicy::Follow => Policy::limited(MAX_REDIRECTS),
        RedirectPolicy::Suppress | RedirectPolicy::Store => Policy::none(),
    };

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(redirect_policy)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a reqwest client
///
/// Requests are made on behalf of the site at `site_origin`; no-cors responses
/// from that origin stay readable.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    site_origin: Url,
}

impl HttpFetcher {
    pub fn new(client: Client, site_origin: Url) -> Self {
        Self {
            client,
            site_origin,
        }
    }

    /// Builds the client from configuration
    pub fn from_config(
        config: &NetworkConfig,
        redirects: RedirectPolicy,
        site_origin: &Url,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config, redirects)?,
            site_origin.clone(),
        ))
    }

    pub fn site_origin(&self) -> &Url {
        &self.site_origin
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, mode: FetchMode) -> FetchResult {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        tracing::trace!("Fetching {} ({:?})", url, mode);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .to_vec();

        if mode.is_opaque_for(Some(&self.site_origin), url) {
            Ok(Response::opaque(body))
        } else {
            Ok(Response::from_parts(status, headers, body, false))
        }
    }
}

/// Copies response headers, dropping values that are not valid text
fn collect_headers(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
