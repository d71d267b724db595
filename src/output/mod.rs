//! Output module for cache status reports
//!
//! The same report backs the `GET_CACHE_STATUS` control message and the CLI's
//! `--status` flag.

mod status;

pub use status::{load_cache_status, print_cache_status, CacheStatus};
