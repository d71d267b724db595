//! Lifecycle manager - install and activate
//!
//! Install seeds the current store with the shell set and, by default, crawls the
//! whole site. Activate purges every stale store, claims open pages and tells them
//! the agent is ready.

use crate::agent::messages::StatusMessage;
use crate::agent::Agent;
use crate::crawler::CrawlReport;
use crate::fetcher::FetchMode;
use crate::state::AgentState;
use crate::store::{self, CacheStorage};
use crate::url::{resolve_against, store_key};

/// Outcome of [`Agent::install`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    /// Shell paths now in the store
    pub shell_cached: Vec<String>,
    /// Shell paths that could not be fetched or stored
    pub shell_failed: Vec<String>,
    /// Present when install ran a crawl
    pub crawl: Option<CrawlReport>,
}

/// Outcome of [`Agent::activate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub cache_name: String,
    /// Stale store names removed
    pub deleted: Vec<String>,
    /// Pages taken under control
    pub claimed: usize,
}

impl Agent {
    /// Installs this version of the agent
    ///
    /// Shell and crawl failures are logged and never fail the install; only an
    /// invalid lifecycle transition does.
    pub async fn install(&self) -> crate::Result<InstallReport> {
        self.transition(AgentState::Installing)?;
        // A newly installed version takes over without waiting for old pages
        self.skip_waiting();

        let cache_name = self.config().cache_name();
        tracing::info!("Installing {}", cache_name);

        let mut report = InstallReport {
            cache_name: cache_name.clone(),
            ..Default::default()
        };

        match store::open_quietly(self.caches().as_ref(), &cache_name).await {
            Some(cache) => {
                for path in self.config().shell.paths() {
                    if self.cache_shell_path(cache.as_ref(), path).await {
                        report.shell_cached.push(path.to_string());
                    } else {
                        report.shell_failed.push(path.to_string());
                    }
                }
            }
            None => {
                report.shell_failed = self
                    .config()
                    .shell
                    .paths()
                    .into_iter()
                    .map(String::from)
                    .collect();
            }
        }

        if !report.shell_failed.is_empty() {
            tracing::warn!(
                "Shell precache incomplete, missing: {}",
                report.shell_failed.join(", ")
            );
        }

        if self.config().crawler.crawl_on_install {
            report.crawl = Some(self.crawler().crawl_site().await);
        }

        self.transition(AgentState::Installed)?;
        tracing::info!(
            "Installed {} ({} shell entries cached)",
            cache_name,
            report.shell_cached.len()
        );
        Ok(report)
    }

    /// Activates the installed version
    pub async fn activate(&self) -> crate::Result<ActivateReport> {
        self.transition(AgentState::Activating)?;

        let cache_name = self.config().cache_name();
        let mut report = ActivateReport {
            cache_name: cache_name.clone(),
            ..Default::default()
        };

        let names = match self.caches().keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("Failed to list stores: {}", e);
                Vec::new()
            }
        };

        for name in names.into_iter().filter(|name| *name != cache_name) {
            match self.caches().delete(&name).await {
                Ok(true) => {
                    tracing::info!("Deleted stale store {}", name);
                    report.deleted.push(name);
                }
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to delete stale store {}: {}", name, e),
            }
        }

        // The current store exists after activation even if install cached nothing
        store::open_quietly(self.caches().as_ref(), &cache_name).await;

        report.claimed = self.clients().claim();
        self.clients().post_all(&StatusMessage::SwReady {
            message: format!("{} active", cache_name),
        });

        self.transition(AgentState::Activated)?;
        tracing::info!(
            "Activated {} ({} stale stores removed, {} clients claimed)",
            cache_name,
            report.deleted.len(),
            report.claimed
        );
        Ok(report)
    }

    /// Installs then immediately activates
    pub async fn start(&self) -> crate::Result<(InstallReport, ActivateReport)> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Fetches one shell path and stores it if the response is ok
    async fn cache_shell_path(&self, cache: &dyn store::ContentStore, path: &str) -> bool {
        let url = match resolve_against(self.origin(), path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid shell path {}: {}", path, e);
                return false;
            }
        };

        match self.fetcher().fetch(&url, FetchMode::Cors).await {
            Ok(response) if response.ok() => {
                store::put_quietly(cache, &store_key(&url), &response).await
            }
            Ok(response) => {
                tracing::warn!("Shell path {} returned HTTP {}", url, response.status());
                false
            }
            Err(e) => {
                tracing::warn!("Shell path {} unavailable: {}", url, e);
                false
            }
        }
    }
}
