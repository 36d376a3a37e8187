//! Configuration for the token authority

use chrono::Duration;

use am_shared::config::CsrfConfig;
use am_shared::protocol::DEFAULT_TOKEN_LIFETIME_SECS;

/// Configuration for the token authority
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// How long an issued token stays valid
    pub token_lifetime: Duration,
    /// Fraction of issuance calls that trigger an expiry sweep
    pub cleanup_probability: f64,
    /// Delete tokens after their first successful validation
    pub single_use: bool,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS as i64),
            cleanup_probability: 0.1,
            single_use: false,
        }
    }
}

impl From<&CsrfConfig> for AuthorityConfig {
    fn from(config: &CsrfConfig) -> Self {
        Self {
            token_lifetime: Duration::seconds(config.token_lifetime_secs as i64),
            cleanup_probability: config.cleanup_probability.clamp(0.0, 1.0),
            single_use: config.single_use,
        }
    }
}
