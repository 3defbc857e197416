//! Session and retry configuration
//!
//! A [`CrawlSession`] is assembled once from the command line before the
//! crawl starts and is read-only for the lifetime of the run.

use std::path::PathBuf;
use url::Url;

/// Default location of the output file, relative to the working directory
pub const DEFAULT_OUTPUT_PATH: &str = "data/items.jsonl";

/// Immutable description of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSession {
    /// Absolute URL the crawl starts from
    pub start_url: Url,

    /// Maximum number of pages to process
    pub max_pages: u32,

    /// Minimum spacing between physical requests (milliseconds)
    pub delay_ms: u64,

    /// Log intended actions without network access or output writes
    pub dry_run: bool,

    /// Destination of the newline-delimited JSON output
    pub output_path: PathBuf,
}

impl CrawlSession {
    /// Creates a session with the default output location
    pub fn new(start_url: Url, max_pages: u32, delay_ms: u64, dry_run: bool) -> Self {
        Self {
            start_url,
            max_pages,
            delay_ms,
            dry_run,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }

    /// Overrides the output destination, for callers that own their paths
    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = path;
        self
    }
}

/// Retry behavior for a single logical fetch
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of physical attempts per logical fetch
    pub max_retries: u32,

    /// Base of the exponential backoff: attempt N waits factor^N seconds
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Backoff duration before the attempt after `attempt_index` (zero-based)
    pub fn backoff_after(&self, attempt_index: u32) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.backoff_factor.pow(attempt_index)))
    }
}
