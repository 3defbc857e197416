//! Politeness delay between outbound requests
//!
//! The limiter enforces a minimum spacing between physical requests. It is
//! based on the monotonic clock, so wall-clock adjustments cannot shorten
//! or stretch the wait.

use std::time::{Duration, Instant};

/// Enforces a minimum interval between consecutive requests
///
/// The recorded timestamp is owned exclusively by the limiter and is updated
/// only when [`wait`](RateLimiter::wait) returns, immediately before the
/// caller issues its request.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing in milliseconds
    ///
    /// A zero interval disables waiting entirely.
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            last_request: None,
        }
    }

    /// Blocks until at least the configured interval has elapsed since the
    /// previous recorded request, then records the new request time
    ///
    /// Never fails; the first call returns immediately.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
