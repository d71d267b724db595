//! Tidepool: an offline-caching agent for static sites
//!
//! This crate implements the request-interception and cache-population policy of
//! an offline agent: it seeds a versioned content store with a shell set, crawls
//! the site breadth-first to fill the store, and answers intercepted requests from
//! the network or the store depending on the request kind and network health.
//!
//! The network and the store are capabilities ([`fetcher::Fetcher`],
//! [`store::CacheStorage`]) injected at construction, so the whole policy runs
//! against in-memory fakes in tests.

pub mod agent;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod http;
pub mod links;
pub mod output;
pub mod state;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Tidepool operations
#[derive(Debug, Error)]
pub enum TidepoolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetcher::FetchError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid lifecycle transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::AgentState,
        to: state::AgentState,
    },

    #[error("Message error: {0}")]
    Message(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL cannot be used as a base: {0}")]
    CannotBeBase(String),
}

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, TidepoolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use agent::{Agent, EventLifetime, Interception, ResponseSource};
pub use config::Config;
pub use http::{Destination, Request, RequestMode, Response};
pub use state::AgentState;
pub use url::{is_same_origin, store_key};
