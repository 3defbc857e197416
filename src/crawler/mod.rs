//! Crawler module
//!
//! Wires the controller, the retrying fetcher, and the rate limiter
//! together. The controller drives the whole run; the fetcher and limiter
//! are its only time-consuming collaborators.

mod controller;
mod fetcher;
mod rate_limit;

pub use controller::{run_crawl, CrawlController, CrawlReport, StopReason};
pub use fetcher::{build_http_client, FetchOutcome, RetryingFetcher, USER_AGENT};
pub use rate_limit::RateLimiter;
