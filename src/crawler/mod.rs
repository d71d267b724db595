//! Crawler module for populating the content store
//!
//! This module contains the crawling logic, including:
//! - The breadth-first frontier with its visited ceiling
//! - The site crawler that fetches, stores and follows links

mod frontier;
mod site_crawler;

pub use frontier::CrawlFrontier;
pub use site_crawler::{CrawlReport, SiteCrawler};
