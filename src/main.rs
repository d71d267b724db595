//! Tidepool main entry point
//!
//! This is the command-line interface for the Tidepool offline agent.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tidepool::agent::{precache, Agent, EventLifetime, Interception};
use tidepool::config::{load_config_with_hash, Config};
use tidepool::fetcher::HttpFetcher;
use tidepool::http::{Destination, Request};
use tidepool::output::{load_cache_status, print_cache_status};
use tidepool::store::SqliteCacheStorage;
use tidepool::url::resolve_against;
use tracing_subscriber::EnvFilter;

/// Tidepool: an offline-caching agent for static sites
///
/// Tidepool seeds a versioned content store with a site's shell pages, crawls
/// the site to fill it, and answers requests from the network or the store
/// depending on network health.
#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(version)]
#[command(about = "An offline-caching agent for static sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the store name and shell set without fetching
    #[arg(long, conflicts_with_all = ["status", "install_only", "crawl", "fetch", "precache"])]
    dry_run: bool,

    /// Show the current store's entries and exit
    #[arg(long, conflicts_with_all = ["install_only", "crawl", "fetch", "precache"])]
    status: bool,

    /// Install without activating (stale stores are kept)
    #[arg(long, conflicts_with_all = ["crawl", "fetch", "precache"])]
    install_only: bool,

    /// Crawl the site into the current store and exit
    #[arg(long, conflicts_with_all = ["fetch", "precache"])]
    crawl: bool,

    /// Run one GET request through the interceptor and print the outcome
    #[arg(long, value_name = "URL", conflicts_with = "precache")]
    fetch: Option<String>,

    /// Treat the --fetch request as a navigation
    #[arg(long, requires = "fetch")]
    navigate: bool,

    /// Destination of the --fetch request (document, image, script, style, font)
    #[arg(long, value_name = "KIND", requires = "fetch", conflicts_with = "navigate")]
    destination: Option<String>,

    /// Fetch and store the given URLs (relative URLs resolve against the origin)
    #[arg(long, value_name = "URL", num_args = 1..)]
    precache: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        return handle_dry_run(&config);
    }
    if cli.status {
        return handle_status(&config).await;
    }

    let agent = build_agent(config)?;

    if cli.install_only {
        handle_install(&agent).await
    } else if cli.crawl {
        handle_crawl(&agent).await
    } else if let Some(url) = &cli.fetch {
        handle_fetch(&agent, url, cli.navigate, cli.destination.as_deref()).await
    } else if !cli.precache.is_empty() {
        handle_precache(&agent, &cli.precache).await
    } else {
        handle_start(&agent).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tidepool=info,warn"),
            1 => EnvFilter::new("tidepool=debug,info"),
            2 => EnvFilter::new("tidepool=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds an agent backed by the SQLite store and the reqwest fetcher
fn build_agent(config: Config) -> Result<Agent, Box<dyn std::error::Error>> {
    let caches = SqliteCacheStorage::new(Path::new(&config.storage.database_path))?;
    let fetcher = HttpFetcher::from_config(
        &config.network,
        config.policy.redirects,
        &config.origin_url()?,
    )?;
    Ok(Agent::new(config, Arc::new(caches), Arc::new(fetcher))?)
}

/// Handles the --dry-run mode: validates config and shows what would be cached
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tidepool Dry Run ===\n");

    println!("Agent:");
    println!("  Origin: {}", config.agent.origin);
    println!("  Store: {}", config.cache_name());

    println!("\nShell ({} paths):", config.shell.paths().len());
    let origin = config.origin_url()?;
    for path in config.shell.paths() {
        println!("  - {}", resolve_against(&origin, path)?);
    }

    println!("\nCrawler:");
    println!("  Max visited: {}", config.crawler.max_visited);
    println!("  Crawl on install: {}", config.crawler.crawl_on_install);
    println!("  Cross-origin: {}", config.crawler.crawl_cross_origin);
    println!("  Link extractor: {:?}", config.crawler.link_extractor);
    if config.crawler.use_crawl_marker {
        println!("  Marker: {}", config.crawler.marker_path);
    }

    println!("\nPolicy:");
    println!("  Redirects: {:?}", config.policy.redirects);

    println!("\nNetwork:");
    println!("  User agent: {}", config.network.user_agent);
    println!("  Timeout: {}s", config.network.timeout_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --status mode: lists the current store
async fn handle_status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let caches = SqliteCacheStorage::new(Path::new(&config.storage.database_path))?;
    let marker = if config.crawler.use_crawl_marker {
        Some(resolve_against(&config.origin_url()?, &config.crawler.marker_path)?.to_string())
    } else {
        None
    };

    let status = load_cache_status(&caches, &config.cache_name(), marker.as_deref()).await?;
    print_cache_status(&status);

    Ok(())
}

/// Handles --install-only
async fn handle_install(agent: &Agent) -> Result<(), Box<dyn std::error::Error>> {
    let report = agent.install().await?;

    println!("Installed {}", report.cache_name);
    println!("  Shell cached: {}", report.shell_cached.join(", "));
    if !report.shell_failed.is_empty() {
        println!("  Shell failed: {}", report.shell_failed.join(", "));
    }
    if let Some(crawl) = &report.crawl {
        println!(
            "  Crawl: {} visited, {} stored, {} failed",
            crawl.visited, crawl.stored, crawl.failed
        );
    }

    Ok(())
}

/// Handles the default mode: install, then activate
async fn handle_start(agent: &Agent) -> Result<(), Box<dyn std::error::Error>> {
    let (installed, activated) = agent.start().await?;

    println!("Store {} is active", activated.cache_name);
    println!(
        "  Shell: {} cached, {} failed",
        installed.shell_cached.len(),
        installed.shell_failed.len()
    );
    if let Some(crawl) = &installed.crawl {
        println!(
            "  Crawl: {} visited, {} stored, {} failed{}",
            crawl.visited,
            crawl.stored,
            crawl.failed,
            if crawl.ceiling_reached { " (ceiling reached)" } else { "" }
        );
    }
    if !activated.deleted.is_empty() {
        println!("  Removed stale stores: {}", activated.deleted.join(", "));
    }

    Ok(())
}

/// Handles --crawl
async fn handle_crawl(agent: &Agent) -> Result<(), Box<dyn std::error::Error>> {
    let report = agent.crawler().crawl_site().await;

    println!(
        "Crawl finished: {} visited, {} stored, {} failed, {} discovered",
        report.visited, report.stored, report.failed, report.discovered
    );
    if report.ceiling_reached {
        println!("  Stopped at the {} URL ceiling", agent.config().crawler.max_visited);
    }

    Ok(())
}

/// Handles --fetch: runs one request through the interceptor
async fn handle_fetch(
    agent: &Agent,
    raw_url: &str,
    navigate: bool,
    destination: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = resolve_against(agent.origin(), raw_url)?;
    let request = if navigate {
        Request::navigate(url)
    } else {
        Request::subresource(url, destination.map(Destination::from_hint).unwrap_or_default())
    };

    let lifetime = EventLifetime::new();
    let outcome = agent.interceptor().handle(&request, &lifetime).await;

    match &outcome {
        Interception::PassThrough => println!("{} -> passed through", request.url()),
        Interception::Responded { response, source } => {
            println!(
                "{} -> HTTP {} from {:?} ({} bytes{})",
                request.url(),
                response.status(),
                source,
                response.body().len(),
                if response.is_opaque() { ", opaque" } else { "" }
            );
            if let Some(content_type) = response.content_type() {
                println!("  Content-Type: {}", content_type);
            }
        }
    }

    tracing::info!("Waiting for {} background tasks", lifetime.pending());
    lifetime.settled().await;

    Ok(())
}

/// Handles --precache
async fn handle_precache(agent: &Agent, urls: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let stored = precache(
        agent.origin(),
        agent.caches().as_ref(),
        agent.fetcher().as_ref(),
        &agent.config().cache_name(),
        urls,
    )
    .await;

    println!("Precached {} of {} URLs", stored, urls.len());

    Ok(())
}
