//! Integration tests for Tidepool
//!
//! These tests run the agent against wiremock servers through the reqwest
//! fetcher, with the SQLite store underneath.

mod agent_tests;
mod crawl_tests;
