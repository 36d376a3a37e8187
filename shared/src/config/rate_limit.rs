//! Rate limiting configuration for the token issuance endpoint

use serde::{Deserialize, Serialize};

/// Issuance rate limits, applied per session id
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueRateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Max issuance calls per session per window
    #[serde(default = "default_max_per_window")]
    pub max_per_window: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for IssueRateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_per_window: default_max_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

impl IssueRateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let max_per_window = std::env::var("CSRF_ISSUE_MAX_PER_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_per_window);
        let window_secs = std::env::var("CSRF_ISSUE_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_window_secs);

        Self {
            enabled: default_enabled(),
            max_per_window,
            window_secs,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_per_window() -> u32 {
    30
}

fn default_window_secs() -> u64 {
    60
}
