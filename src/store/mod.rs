//! Content store module
//!
//! This module defines the capability the agent uses to persist responses:
//! - [`CacheStorage`]: the set of named stores (open, list, delete)
//! - [`ContentStore`]: one store, a key→response mapping
//!
//! Two backends are provided: [`MemoryCacheStorage`] for tests and embedded hosts,
//! and [`SqliteCacheStorage`] for the command-line agent.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::{MemoryCacheStorage, MemoryStore};
pub use sqlite::{SqliteCacheStorage, SqliteStore};
pub use traits::{CacheStorage, ContentStore, StoreError, StoreResult};

use crate::http::Response;
use std::sync::Arc;

/// Opens a store, logging and swallowing failures
///
/// Store failures are never fatal to the agent; callers treat a store that cannot
/// be opened as an empty one.
pub async fn open_quietly(storage: &dyn CacheStorage, name: &str) -> Option<Arc<dyn ContentStore>> {
    match storage.open(name).await {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("Failed to open store {}: {}", name, e);
            None
        }
    }
}

/// Looks up a key, treating store errors as a miss
pub async fn match_quietly(store: &dyn ContentStore, key: &str) -> Option<Response> {
    match store.match_url(key).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Store lookup failed for {} in {}: {}", key, store.name(), e);
            None
        }
    }
}

/// Stores a response, logging and swallowing failures
///
/// Returns true if the write succeeded.
pub async fn put_quietly(store: &dyn ContentStore, key: &str, response: &Response) -> bool {
    match store.put(key, response).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to store {} in {}: {}", key, store.name(), e);
            false
        }
    }
}
