use crate::http::Response;
use crate::url::is_same_origin;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// How a fetch is made, mirroring the browser's request modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Readable fetch: status, headers and body are visible to the agent
    Cors,
    /// Fetch without a CORS check
    ///
    /// Cross-origin responses come back opaque: they can be stored and replayed
    /// but not inspected. A same-origin no-cors response stays readable.
    NoCors,
}

impl FetchMode {
    /// True if a response to `url` fetched in this mode is opaque to a page at `site`
    ///
    /// Without a known site origin every no-cors response is treated as cross-origin.
    pub fn is_opaque_for(self, site: Option<&Url>, url: &Url) -> bool {
        match self {
            FetchMode::Cors => false,
            FetchMode::NoCors => site.map_or(true, |site| !is_same_origin(site, url)),
        }
    }
}

/// Network-level failures; HTTP error statuses are responses, not errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),
}

/// Result type for fetch operations
pub type FetchResult = Result<Response, FetchError>;

/// Capability for reaching the network
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` with a GET in the given mode
    async fn fetch(&self, url: &Url, mode: FetchMode) -> FetchResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_opacity_follows_origin() {
        let site = url("https://games.example.com/");

        assert!(!FetchMode::Cors.is_opaque_for(Some(&site), &url("https://cdn.example.net/a.js")));
        assert!(!FetchMode::NoCors.is_opaque_for(Some(&site), &url("https://games.example.com/a.html")));
        assert!(FetchMode::NoCors.is_opaque_for(Some(&site), &url("https://cdn.example.net/a.js")));
        assert!(FetchMode::NoCors.is_opaque_for(None, &url("https://games.example.com/a.html")));
    }
}
