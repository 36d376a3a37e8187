//! Token authority service
//!
//! Issues, validates, and expires CSRF tokens against a [`TokenStore`]
//! backend, and rate limits the issuance endpoint per session.

mod config;
mod rate_limiter;
mod service;


pub use config::AuthorityConfig;
pub use rate_limiter::{IssueRateLimiter, RateLimitDecision};
pub use service::TokenAuthority;
