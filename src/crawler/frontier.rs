//! Breadth-first crawl frontier
//!
//! The frontier owns the pending queue and the visited-set of one crawl. It is
//! never persisted: a crawl that is interrupted simply starts over next time.

use crate::url::store_key;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// FIFO queue of pending URLs with visited and queued sets
///
/// Invariants:
/// - a URL is never queued twice, nor queued after it was visited
/// - at most `max_visited` URLs are ever handed out by [`CrawlFrontier::next_url`]
#[derive(Debug)]
pub struct CrawlFrontier {
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    max_visited: usize,
}

impl CrawlFrontier {
    /// Creates an empty frontier with a ceiling on visited URLs
    pub fn new(max_visited: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_visited,
        }
    }

    /// Enqueues a URL unless it was already visited or queued
    ///
    /// Returns true if the URL was added.
    pub fn push(&mut self, url: Url) -> bool {
        let key = store_key(&url);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }

        self.queued.insert(key);
        self.queue.push_back(url);
        true
    }

    /// Takes the next URL to visit and marks it visited
    ///
    /// Returns None when the queue is empty or the visited ceiling is reached.
    pub fn next_url(&mut self) -> Option<Url> {
        while self.visited.len() < self.max_visited {
            let url = self.queue.pop_front()?;
            let key = store_key(&url);
            self.queued.remove(&key);

            if self.visited.insert(key) {
                return Some(url);
            }
        }

        None
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&store_key(url))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs waiting to be visited
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns true once the visited ceiling has been reached
    pub fn is_exhausted(&self) -> bool {
        self.visited.len() >= self.max_visited
    }
}
