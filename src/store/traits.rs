//! Store traits and error types
//!
//! A [`CacheStorage`] holds any number of named [`ContentStore`]s. The agent only
//! ever writes to the store named after the current version; every other name is
//! stale and gets deleted on activation.

use crate::http::Response;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Quota exceeded: store '{store}' is limited to {limit} entries")]
    QuotaExceeded { store: String, limit: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A single named key→response mapping
///
/// Keys are store keys as produced by [`crate::url::store_key`]. Each operation is
/// atomic on its own; nothing spans multiple keys, so concurrent writers to the
/// same key resolve as last-writer-wins.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The name this store was opened under
    fn name(&self) -> &str;

    /// Looks up the response stored under `key`
    async fn match_url(&self, key: &str) -> StoreResult<Option<Response>>;

    /// Stores `response` under `key`, replacing any previous entry
    async fn put(&self, key: &str, response: &Response) -> StoreResult<()>;

    /// Removes the entry under `key`, returning whether one existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Lists every key in the store
    async fn keys(&self) -> StoreResult<Vec<String>>;
}

/// The set of named content stores available to the agent
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the store with the given name, creating it if needed
    async fn open(&self, name: &str) -> StoreResult<Arc<dyn ContentStore>>;

    /// Returns true if a store with this name exists
    async fn has(&self, name: &str) -> StoreResult<bool>;

    /// Deletes a whole store, returning whether it existed
    async fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Lists the names of every store
    async fn keys(&self) -> StoreResult<Vec<String>>;
}
