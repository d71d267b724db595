//! Lifetime extension for background work
//!
//! A host may recycle an idle agent at any time. Work that outlives the response
//! it was spawned next to (background refreshes, crawls, precaching) is
//! registered on an [`EventLifetime`], and the host awaits
//! [`EventLifetime::settled`] before it tears the agent down.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Token tracking detached tasks spawned while handling one or more events
///
/// Cloning the token shares the same task list.
#[derive(Clone, Default)]
pub struct EventLifetime {
    tasks: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
}

impl EventLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` and keeps the lifetime open until it finishes
    ///
    /// The task starts immediately; the caller never waits for it.
    pub fn wait_until<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        tracing::trace!("Extended lifetime for background task {}", label);

        match self.tasks.lock() {
            Ok(mut tasks) => tasks.push((label, handle)),
            // The task still runs; it just cannot be awaited
            Err(_) => tracing::warn!("Lifetime registry poisoned; {} runs untracked", label),
        }
    }

    /// Number of registered tasks that have not finished yet
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().filter(|(_, h)| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Waits for every registered task, including tasks registered while waiting
    pub async fn settled(&self) {
        loop {
            let batch = match self.tasks.lock() {
                Ok(mut tasks) => std::mem::take(&mut *tasks),
                Err(_) => return,
            };

            if batch.is_empty() {
                return;
            }

            for (label, handle) in batch {
                if let Err(e) = handle.await {
                    tracing::warn!("Background task {} ended abnormally: {}", label, e);
                }
            }
        }
    }
}
