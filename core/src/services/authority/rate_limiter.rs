//! Rate limiting for the token issuance endpoint

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use am_shared::config::IssueRateLimitConfig;

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Under the limit; `remaining` calls left in the current window
    Allowed { remaining: u32 },
    /// Over the limit; retry after the window resets
    Limited { retry_after_secs: u64 },
}

#[derive(Debug)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Fixed-window issuance counter, keyed by session id
///
/// Expired windows are dropped opportunistically whenever the map grows past a
/// small threshold, so abandoned sessions do not accumulate.
pub struct IssueRateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    config: IssueRateLimitConfig,
}

const PRUNE_THRESHOLD: usize = 1024;

impl IssueRateLimiter {
    /// Create a limiter with the given configuration
    pub fn new(config: IssueRateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Record one issuance attempt for `session_id` and decide whether it may
    /// proceed
    pub fn check(&self, session_id: &str) -> RateLimitDecision {
        if !self.config.enabled {
            return RateLimitDecision::Allowed {
                remaining: self.config.max_per_window,
            };
        }

        let now = Utc::now();
        let window_len = Duration::seconds(self.config.window_secs as i64);
        let mut windows = self.windows.lock().unwrap();

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now - w.started_at < window_len);
        }

        let window = windows
            .entry(session_id.to_string())
            .or_insert_with(|| Window {
                started_at: now,
                count: 0,
            });

        if now - window.started_at >= window_len {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.config.max_per_window {
            let elapsed = (now - window.started_at).num_seconds().max(0) as u64;
            let retry_after_secs = self.config.window_secs.saturating_sub(elapsed).max(1);
            warn!(retry_after_secs, "issuance rate limit hit");
            return RateLimitDecision::Limited { retry_after_secs };
        }

        window.count += 1;
        RateLimitDecision::Allowed {
            remaining: self.config.max_per_window - window.count,
        }
    }
}
