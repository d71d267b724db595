//! Configuration module for Tidepool
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is immutable and shared by every component; it is the
//! only place the store version tag lives.
//!
//! # Example
//!
//! ```no_run
//! use tidepool::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tidepool.toml")).unwrap();
//! println!("Current store: {}", config.cache_name());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AgentConfig, Config, CrawlerConfig, ExtractorKind, NetworkConfig, PolicyConfig,
    RedirectPolicy, ShellConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
