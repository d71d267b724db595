//! Cache status loading and display

use crate::agent::StatusMessage;
use crate::store::{CacheStorage, StoreResult};

/// Snapshot of the current content store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatus {
    /// Name of the store the snapshot was taken from
    pub cache_name: String,

    /// Number of listed entries
    pub count: usize,

    /// Store keys, marker excluded
    pub urls: Vec<String>,

    /// Stale stores still present alongside the current one
    pub stale_caches: Vec<String>,
}

impl CacheStatus {
    /// Message form posted to client pages
    pub fn to_message(&self) -> StatusMessage {
        StatusMessage::CacheStatus {
            count: self.count,
            urls: self.urls.clone(),
        }
    }
}

/// Loads the status of the store named `cache_name`
///
/// `exclude` holds keys left out of the listing (the crawl marker).
pub async fn load_cache_status(
    caches: &dyn CacheStorage,
    cache_name: &str,
    exclude: Option<&str>,
) -> StoreResult<CacheStatus> {
    let store = caches.open(cache_name).await?;
    let urls: Vec<String> = store
        .keys()
        .await?
        .into_iter()
        .filter(|key| Some(key.as_str()) != exclude)
        .collect();

    let stale_caches = caches
        .keys()
        .await?
        .into_iter()
        .filter(|name| name != cache_name)
        .collect();

    Ok(CacheStatus {
        cache_name: cache_name.to_string(),
        count: urls.len(),
        urls,
        stale_caches,
    })
}

/// Prints a status report to stdout
pub fn print_cache_status(status: &CacheStatus) {
    println!("=== Cache Status ===\n");
    println!("Store: {}", status.cache_name);
    println!("Entries: {}", status.count);
    println!();

    for url in &status.urls {
        println!("  {}", url);
    }

    if !status.stale_caches.is_empty() {
        println!();
        println!("Stale stores ({}):", status.stale_caches.len());
        for name in &status.stale_caches {
            println!("  - {}", name);
        }
    }
}
