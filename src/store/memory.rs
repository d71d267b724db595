//! In-memory store backend
//!
//! Used by tests and by hosts that do not need persistence. An optional entry
//! quota makes it possible to exercise the quota-exceeded path.

use crate::http::Response;
use crate::store::traits::{CacheStorage, ContentStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// In-memory collection of named stores
#[derive(Default)]
pub struct MemoryCacheStorage {
    stores: Mutex<HashMap<String, Arc<MemoryStore>>>,
    quota: Option<usize>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits every store to `limit` entries; puts of new keys beyond it fail
    pub fn with_quota(limit: usize) -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            quota: Some(limit),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> StoreResult<Arc<dyn ContentStore>> {
        let mut stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
        let store: Arc<dyn ContentStore> = stores
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating in-memory store {}", name);
                Arc::new(MemoryStore::new(name, self.quota))
            })
            .clone();
        Ok(store)
    }

    async fn has(&self, name: &str) -> StoreResult<bool> {
        let stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(stores.contains_key(name))
    }

    async fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(stores.remove(name).is_some())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// A single in-memory store; keys are listed in sorted order
pub struct MemoryStore {
    name: String,
    entries: Mutex<BTreeMap<String, Response>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new(name: &str, quota: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(BTreeMap::new()),
            quota,
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_url(&self, key: &str) -> StoreResult<Option<Response>> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, response: &Response) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;

        if let Some(limit) = self.quota {
            if !entries.contains_key(key) && entries.len() >= limit {
                return Err(StoreError::QuotaExceeded {
                    store: self.name.clone(),
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}
