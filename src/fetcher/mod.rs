//! Network fetcher module
//!
//! This module defines the agent's only way to reach the network:
//! - [`Fetcher`]: the capability trait, with a cors/no-cors [`FetchMode`]
//! - [`HttpFetcher`]: reqwest-backed implementation
//! - [`ScriptedFetcher`]: route-table implementation for replay and tests

mod client;
mod scripted;
mod traits;

pub use client::{build_http_client, HttpFetcher};
pub use scripted::{FetchRecord, ScriptedFetcher};
pub use traits::{FetchError, FetchMode, FetchResult, Fetcher};
