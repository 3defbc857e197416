//! HTTP fetcher with retry and backoff
//!
//! One logical fetch may take several physical attempts. Each attempt is
//! classified into a [`FetchOutcome`] and the retry loop branches on the
//! variant: terminal failures stop immediately, retryable ones back off
//! exponentially until the attempt budget is spent.

use crate::config::RetryPolicy;
use crate::crawler::rate_limit::RateLimiter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Identifying user agent sent with every request
pub const USER_AGENT: &str =
    "QuoteHarvest/1.0 (+https://github.com/quote-harvest/quote-harvest; bot@quoteharvest.dev)";

/// Result of one physical fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with a readable body
    Success {
        /// Page body content
        body: String,
        /// HTTP status code
        status: u16,
    },

    /// Failure that no retry can recover (HTTP 404)
    Terminal {
        /// Human-readable cause, for the log
        reason: String,
    },

    /// Failure worth another attempt (other HTTP errors, timeouts,
    /// transport errors)
    Retryable {
        /// Human-readable cause, for the log
        reason: String,
    },
}

/// Builds the shared HTTP client
///
/// The client follows redirects automatically (up to 10 hops), carries the
/// identifying user agent plus standard content-negotiation headers, and
/// applies a 30 second request timeout.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs logical fetches as rate-limited, retried physical attempts
pub struct RetryingFetcher {
    client: Client,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    /// Creates a fetcher from a prebuilt client, limiter, and retry policy
    pub fn new(client: Client, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            policy,
        }
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// The rate limiter gates every physical attempt, not just the logical
    /// fetch. Returns the page body on success, `None` on a terminal 404 or
    /// once `max_retries` attempts are exhausted; the two causes are
    /// distinguished in the log, not in the return value.
    pub async fn fetch(&mut self, target: &Url) -> Option<String> {
        for attempt in 0..self.policy.max_retries {
            self.limiter.wait().await;

            match self.attempt(target).await {
                FetchOutcome::Success { body, status } => {
                    tracing::debug!("fetched {} (status: {})", target, status);
                    return Some(body);
                }
                FetchOutcome::Terminal { reason } => {
                    tracing::error!("fetch of {} failed terminally: {}", target, reason);
                    return None;
                }
                FetchOutcome::Retryable { reason } => {
                    tracing::warn!("attempt {} failed for {}: {}", attempt + 1, target, reason);
                }
            }

            // No backoff after the final permitted attempt
            if attempt + 1 < self.policy.max_retries {
                let backoff = self.policy.backoff_after(attempt);
                tracing::info!("retrying {} in {}s", target, backoff.as_secs());
                tokio::time::sleep(backoff).await;
            }
        }

        tracing::error!(
            "max retries ({}) reached for {}",
            self.policy.max_retries,
            target
        );
        None
    }

    /// One physical attempt, classified
    ///
    /// Transport errors of any kind (timeouts, DNS failures, unreadable
    /// bodies) are classified rather than propagated; this method cannot
    /// fail the caller.
    async fn attempt(&self, target: &Url) -> FetchOutcome {
        let response = match self.client.get(target.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection error: {}", e)
                } else {
                    e.to_string()
                };
                return FetchOutcome::Retryable { reason };
            }
        };

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::Terminal {
                reason: "page not found (404)".to_string(),
            };
        }

        if !status.is_success() {
            return FetchOutcome::Retryable {
                reason: format!("HTTP {}", status.as_u16()),
            };
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success {
                body,
                status: status.as_u16(),
            },
            Err(e) => FetchOutcome::Retryable {
                reason: format!("failed to read body: {}", e),
            },
        }
    }
}
