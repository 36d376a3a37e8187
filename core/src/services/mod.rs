//! Business services

pub mod authority;

pub use authority::{AuthorityConfig, IssueRateLimiter, RateLimitDecision, TokenAuthority};
