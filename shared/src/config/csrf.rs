//! CSRF protection configuration module

use serde::{Deserialize, Serialize};

use crate::protocol::{CSRF_TOKEN_PATH, DEFAULT_TOKEN_LIFETIME_SECS, SESSION_BOOTSTRAP_PATH};

/// CSRF token authority and middleware configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsrfConfig {
    /// Token lifetime in seconds
    #[serde(default = "default_lifetime")]
    pub token_lifetime_secs: u64,

    /// Fraction of issuance calls that trigger an expiry sweep of the
    /// in-process store (0.0 disables the sweep entirely)
    #[serde(default = "default_cleanup_probability")]
    pub cleanup_probability: f64,

    /// Delete a token after its first successful validation. Off by default:
    /// tokens are multi-use within their lifetime.
    #[serde(default)]
    pub single_use: bool,

    /// Paths exempted from the CSRF check. Reviewed whenever a new
    /// state-changing endpoint is added.
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,

    /// Mark the session cookie `Secure` (set when serving over TLS)
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: default_lifetime(),
            cleanup_probability: default_cleanup_probability(),
            single_use: false,
            exempt_paths: default_exempt_paths(),
            secure_cookies: false,
        }
    }
}

impl CsrfConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let token_lifetime_secs = std::env::var("CSRF_TOKEN_LIFETIME_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_lifetime);
        let single_use = std::env::var("CSRF_SINGLE_USE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let secure_cookies = std::env::var("CSRF_SECURE_COOKIES")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            token_lifetime_secs,
            single_use,
            secure_cookies,
            ..Default::default()
        }
    }

    /// Token lifetime as milliseconds, the unit the issuance response uses
    pub fn token_lifetime_ms(&self) -> u64 {
        self.token_lifetime_secs * 1000
    }

    /// Add an exempt path
    pub fn with_exempt_path(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    /// Check whether a request path is exempt from the CSRF check
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }
}

fn default_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

fn default_cleanup_probability() -> f64 {
    0.1
}

fn default_exempt_paths() -> Vec<String> {
    vec![
        CSRF_TOKEN_PATH.to_string(),
        SESSION_BOOTSTRAP_PATH.to_string(),
        "/health".to_string(),
    ]
}
