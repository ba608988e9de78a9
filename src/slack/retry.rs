//! Backoff schedule for Slack rate-limit (`429`) retries.
//!
//! Shared by the reqwest Web API client and the slack-morphism session calls.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// First wait when Slack gives no `Retry-After` hint.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Ceiling for the doubled fallback delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Retries after the first attempt before giving up with `ratelimited`.
pub const MAX_RETRIES: u32 = 3;

/// Per-call retry state.
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            delay: INITIAL_RETRY_DELAY,
            retries: 0,
        }
    }
}

impl Backoff {
    /// Delay before the next attempt, or `None` once retries are spent.
    ///
    /// A server-supplied `retry_after` wins over the doubling fallback.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.retries >= MAX_RETRIES {
            return None;
        }
        self.retries += 1;
        let delay = retry_after.unwrap_or(self.delay);
        self.delay = (self.delay * 2).min(MAX_RETRY_DELAY);
        Some(delay)
    }

    /// Retries handed out so far.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Parse a `Retry-After` header given in whole seconds.
#[must_use]
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
