//! Crawl controller
//!
//! Owns the traversal state machine, including duplicate detection and the
//! stop conditions. The crawl is strictly sequential: one page is fetched
//! and fully processed, and its successor resolved, before the next fetch
//! begins.

use crate::config::CrawlSession;
use crate::crawler::fetcher::{build_http_client, RetryingFetcher, USER_AGENT};
use crate::crawler::rate_limit::RateLimiter;
use crate::extract::{extract_quotes, pagination::next_page_url};
use crate::output::JsonlSink;
use crate::robots::policy_allows;
use crate::{target, HarvestError, Result, RetryPolicy};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Why a crawl run stopped
///
/// Every reason is a normal stop except `FetchFailed`, which is degraded:
/// the run ends early but keeps everything already written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// robots.txt denied the start URL
    PolicyDenied,
    /// The next-page resolver produced an already-visited URL
    DuplicateUrl,
    /// A logical fetch failed terminally or exhausted its retries
    FetchFailed,
    /// Natural end of pagination
    NoNextPage,
    /// The configured page budget was reached
    PageBudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::PolicyDenied => "policy denied",
            StopReason::DuplicateUrl => "duplicate URL encountered",
            StopReason::FetchFailed => "fetch failure",
            StopReason::NoNextPage => "no next page",
            StopReason::PageBudgetExhausted => "page budget exhausted",
        };
        f.write_str(reason)
    }
}

/// Outcome summary of one crawl run
#[derive(Debug)]
pub struct CrawlReport {
    /// Pages processed (or simulated, in dry-run)
    pub pages_crawled: u32,

    /// Records appended to the output
    pub records_written: u64,

    /// Why the run ended
    pub stop_reason: StopReason,

    /// Where the records went (or would have gone, in dry-run)
    pub output_path: PathBuf,
}

/// Drives one crawl run from start URL to a terminal stop
pub struct CrawlController {
    session: CrawlSession,
    fetcher: RetryingFetcher,
    visited: HashSet<String>,
}

impl CrawlController {
    /// Creates a controller for the given session with the default retry
    /// policy
    pub fn new(session: CrawlSession) -> Result<Self> {
        Self::with_retry_policy(session, RetryPolicy::default())
    }

    /// Creates a controller with an explicit retry policy
    pub fn with_retry_policy(session: CrawlSession, policy: RetryPolicy) -> Result<Self> {
        let client = build_http_client()?;
        let limiter = RateLimiter::new(session.delay_ms);
        let fetcher = RetryingFetcher::new(client, limiter, policy);

        Ok(Self {
            session,
            fetcher,
            visited: HashSet::new(),
        })
    }

    /// Runs the crawl to completion and reports how it ended
    ///
    /// The permission check runs once, before anything else. Unless the run
    /// is a dry run, the output destination is truncated exactly once
    /// before the first page is processed. A fetch failure stops the run
    /// but preserves every record already appended.
    pub async fn run(mut self) -> Result<CrawlReport> {
        let start_url = self.session.start_url.clone();
        let site_root = target::site_root(&start_url)
            .ok_or_else(|| HarvestError::NoSiteRoot(start_url.to_string()))?;

        // A dry run bypasses the permission check anyway, and issues no
        // network requests at all
        if !self.session.dry_run {
            let allowed = policy_allows(&site_root, &start_url, USER_AGENT).await;
            if !allowed {
                tracing::error!("crawling not allowed by robots.txt, exiting");
                return Ok(CrawlReport {
                    pages_crawled: 0,
                    records_written: 0,
                    stop_reason: StopReason::PolicyDenied,
                    output_path: self.session.output_path,
                });
            }
        }

        let mut sink = if self.session.dry_run {
            None
        } else {
            Some(JsonlSink::create(&self.session.output_path)?)
        };

        tracing::info!(
            "starting crawl: max_pages={}, delay={}ms, dry_run={}",
            self.session.max_pages,
            self.session.delay_ms,
            self.session.dry_run
        );

        let mut pages_crawled: u32 = 0;
        let mut records_written: u64 = 0;

        if self.session.max_pages == 0 {
            return Ok(CrawlReport {
                pages_crawled,
                records_written,
                stop_reason: StopReason::PageBudgetExhausted,
                output_path: self.session.output_path,
            });
        }

        let mut current_url = start_url;

        let stop_reason = loop {
            // A repeated URL signals a pagination cycle; never re-fetch or
            // re-emit for a URL already processed in this run
            if !self.visited.insert(target::dedup_key(&current_url)) {
                tracing::info!("skipping duplicate URL: {}", current_url);
                break StopReason::DuplicateUrl;
            }

            if self.session.dry_run {
                tracing::info!(
                    "[dry run] would crawl page {}: {}",
                    pages_crawled + 1,
                    current_url
                );
                pages_crawled += 1;

                if pages_crawled >= self.session.max_pages {
                    break StopReason::PageBudgetExhausted;
                }
                match site_root.join(&format!("page/{}/", pages_crawled + 1)) {
                    Ok(next) => current_url = next,
                    Err(e) => {
                        tracing::warn!("cannot synthesize next page URL: {}", e);
                        break StopReason::NoNextPage;
                    }
                }
                continue;
            }

            tracing::info!(
                "crawling page {}/{}: {}",
                pages_crawled + 1,
                self.session.max_pages,
                current_url
            );

            let body = match self.fetcher.fetch(&current_url).await {
                Some(body) => body,
                None => {
                    tracing::error!("failed to fetch {}, stopping crawl", current_url);
                    break StopReason::FetchFailed;
                }
            };

            // Append as we go: a crash mid-run loses at most the current
            // page's unwritten tail, never prior pages
            let records = extract_quotes(&body, &current_url);
            if let Some(sink) = sink.as_mut() {
                for record in &records {
                    sink.append(record)?;
                }
            }
            records_written += records.len() as u64;
            pages_crawled += 1;
            tracing::info!(
                "extracted {} quotes from page {}",
                records.len(),
                pages_crawled
            );

            match next_page_url(&body, &current_url) {
                None => break StopReason::NoNextPage,
                Some(_) if pages_crawled >= self.session.max_pages => {
                    break StopReason::PageBudgetExhausted;
                }
                Some(next) => current_url = next,
            }
        };

        Ok(CrawlReport {
            pages_crawled,
            records_written,
            stop_reason,
            output_path: self.session.output_path,
        })
    }
}

/// Runs a crawl for the given session and logs the terminal summary
pub async fn run_crawl(session: CrawlSession) -> Result<CrawlReport> {
    let controller = CrawlController::new(session)?;
    let report = controller.run().await?;

    tracing::info!("crawl complete ({})", report.stop_reason);
    tracing::info!("pages crawled: {}", report.pages_crawled);
    tracing::info!("total records: {}", report.records_written);
    tracing::info!("output file: {}", report.output_path.display());

    Ok(report)
}
