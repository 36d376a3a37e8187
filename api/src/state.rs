//! Shared application state for the CSRF endpoints and middleware.

use std::sync::Arc;

use am_core::{AuthorityConfig, IssueRateLimiter, TokenAuthority, TokenStore};
use am_shared::config::{CsrfConfig, IssueRateLimitConfig};

/// Everything the issuance routes and the guard middleware need.
///
/// The store is type-erased so the same state works over Redis in production
/// and over the in-process store in tests and degraded mode.
pub struct CsrfState {
    /// Token authority backed by the configured store
    pub authority: TokenAuthority<Arc<dyn TokenStore>>,
    /// Per-session issuance rate limiter
    pub limiter: IssueRateLimiter,
    /// CSRF configuration (lifetime, exempt paths, cookie flags)
    pub csrf: CsrfConfig,
}

impl CsrfState {
    /// Wire up the authority and limiter from configuration.
    pub fn new(
        store: Arc<dyn TokenStore>,
        csrf: CsrfConfig,
        rate_limit: IssueRateLimitConfig,
    ) -> Self {
        let authority = TokenAuthority::new(store, AuthorityConfig::from(&csrf));
        Self {
            authority,
            limiter: IssueRateLimiter::new(rate_limit),
            csrf,
        }
    }
}
