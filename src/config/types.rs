use crate::url::parse_http_url;
use crate::UrlError;
use serde::Deserialize;
use url::Url;

/// Main configuration structure for Tidepool
///
/// Every section has defaults matching the deployed site, so an empty file is a
/// valid configuration apart from `agent.origin`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Creates a configuration with every default for the given origin
    pub fn for_origin(origin: &str) -> Self {
        Self {
            agent: AgentConfig {
                app_prefix: default_app_prefix(),
                version: default_version(),
                origin: origin.to_string(),
            },
            shell: ShellConfig::default(),
            crawler: CrawlerConfig::default(),
            policy: PolicyConfig::default(),
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Returns the name of the current content store: `<app-prefix>-<version>`
    pub fn cache_name(&self) -> String {
        self.agent.cache_name()
    }

    /// Parses the configured origin
    pub fn origin_url(&self) -> Result<Url, UrlError> {
        parse_http_url(&self.agent.origin)
    }
}

/// Identity of the agent and the site it serves
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Prefix shared by every store this agent has ever created
    #[serde(rename = "app-prefix", default = "default_app_prefix")]
    pub app_prefix: String,

    /// Version tag; bumping it invalidates every previously stored response
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin of the site, e.g. "https://games.example.com"
    pub origin: String,
}

impl AgentConfig {
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.app_prefix, self.version)
    }
}

/// The shell set seeded on install and the fallback pages served offline
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Site root
    #[serde(default = "default_root")]
    pub root: String,

    /// Main entry page, last cached fallback before a synthesized 503
    #[serde(rename = "entry-page", default = "default_entry_page")]
    pub entry_page: String,

    /// Page served to navigations that cannot reach the network
    #[serde(rename = "offline-page", default = "default_offline_page")]
    pub offline_page: String,

    /// Optional not-found page, seeded with the shell when present
    #[serde(rename = "not-found-page", default)]
    pub not_found_page: Option<String>,
}

impl ShellConfig {
    /// Paths cached on install, in seeding order
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = vec![
            self.root.as_str(),
            self.entry_page.as_str(),
            self.offline_page.as_str(),
        ];
        if let Some(not_found) = &self.not_found_page {
            paths.push(not_found.as_str());
        }
        paths
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            entry_page: default_entry_page(),
            offline_page: default_offline_page(),
            not_found_page: None,
        }
    }
}

/// Which link extractor the crawler uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Lightweight attribute/url() pattern scan
    #[default]
    Pattern,
    /// Full HTML parse
    Html,
}

/// Site crawler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Hard ceiling on distinct URLs visited by one crawl
    #[serde(rename = "max-visited", default = "default_max_visited")]
    pub max_visited: usize,

    /// Follow links to other origins (fetched opaquely, never parsed)
    #[serde(rename = "crawl-cross-origin", default)]
    pub crawl_cross_origin: bool,

    /// Run a full crawl as part of install
    #[serde(rename = "crawl-on-install", default = "default_true")]
    pub crawl_on_install: bool,

    /// Write a marker entry after a crawl and skip background crawls while it exists
    #[serde(rename = "use-crawl-marker", default)]
    pub use_crawl_marker: bool,

    /// Path of the crawl marker entry
    #[serde(rename = "marker-path", default = "default_marker_path")]
    pub marker_path: String,

    #[serde(rename = "link-extractor", default)]
    pub link_extractor: ExtractorKind,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_visited: default_max_visited(),
            crawl_cross_origin: false,
            crawl_on_install: true,
            use_crawl_marker: false,
            marker_path: default_marker_path(),
            link_extractor: ExtractorKind::default(),
        }
    }
}

/// What the interceptor does with a 3xx answer to a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedirectPolicy {
    /// Never surface the redirect; serve the cache fallback chain instead
    #[default]
    Suppress,
    /// Let the fetcher follow redirects; a 3xx that still arrives is suppressed
    Follow,
    /// Store the redirect under the requested URL and return it
    Store,
}

/// Request interception policy knobs
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub redirects: RedirectPolicy,
}

/// Network client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database holding every named store
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_app_prefix() -> String {
    "unblocked-games".to_string()
}

fn default_version() -> String {
    "1.2.0.3".to_string()
}

fn default_root() -> String {
    "/".to_string()
}

fn default_entry_page() -> String {
    "/index.html".to_string()
}

fn default_offline_page() -> String {
    "/offline.html".to_string()
}

fn default_max_visited() -> usize {
    310
}

fn default_marker_path() -> String {
    "/__tidepool/crawl-complete".to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("tidepool/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_database_path() -> String {
    "./tidepool.db".to_string()
}
