//! Request throttling
//!
//! Every request aimed at the forum waits a short delay, and every
//! `threshold`-th request waits a long cool-down instead. This keeps a full
//! site walk under the radar of ProBoards' server-side throttling, which
//! otherwise starts returning error pages partway through a large scrape.

use crate::config::RateLimitConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared request throttle
///
/// The counter is global across all traversal tasks: the n-th request made
/// by the process decides the delay, no matter which task issues it.
#[derive(Debug)]
pub struct RateLimiter {
    threshold: Option<u64>,
    short_delay: Option<Duration>,
    long_delay: Option<Duration>,
    count: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            threshold: config.request_threshold,
            short_delay: config.short_delay_ms.map(Duration::from_millis),
            long_delay: config.long_delay_ms.map(Duration::from_millis),
            count: AtomicU64::new(0),
        }
    }

    /// A limiter that never delays (for tests and `--no-delay`)
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig::disabled())
    }

    /// Waits the appropriate delay for the next request, then counts it.
    pub async fn throttle(&self) {
        let n = self.count.fetch_add(1, Ordering::SeqCst);

        let is_cooldown = matches!(
            (self.threshold, self.long_delay),
            (Some(t), Some(_)) if n % t == t - 1
        );
        if is_cooldown {
            tracing::debug!("Request {} hit cool-down threshold", n + 1);
        }

        if let Some(delay) = self.delay_for(n) {
            tokio::time::sleep(delay).await;
        }
    }

    /// Number of requests counted so far
    pub fn request_count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// The delay applied before request `n` (0-based), if any.
    fn delay_for(&self, n: u64) -> Option<Duration> {
        match (self.threshold, self.long_delay) {
            (Some(threshold), Some(long)) if n % threshold == threshold - 1 => Some(long),
            _ => self.short_delay,
        }
    }
}
