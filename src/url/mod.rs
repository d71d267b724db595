//! URL handling module for Tidepool
//!
//! This module turns request URLs into store keys and answers the one question the
//! policy asks about any URL: is it same-origin with the site the agent serves?

mod normalize;
mod origin;

pub use normalize::{parse_http_url, store_key};
pub use origin::{is_same_origin, resolve_against};
