//! Quote-Harvest: a polite paginated quote scraper
//!
//! This crate crawls a paginated quote site one page at a time, extracting
//! structured records (quote text, author, tags) and appending them to a
//! newline-delimited JSON file. It respects robots.txt and a minimum delay
//! between requests, and retries transient fetch failures with exponential
//! backoff.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod target;

use thiserror::Error;

/// Main error type for Quote-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("start URL has no usable site root: {0}")]
    NoSiteRoot(String),
}

/// Result type alias for Quote-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::{CrawlSession, RetryPolicy};
pub use crawler::{run_crawl, CrawlController, CrawlReport, StopReason};
pub use extract::QuoteRecord;
