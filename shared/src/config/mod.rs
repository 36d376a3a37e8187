//! Configuration types organized by concern
//!
//! - `cache` - Redis connection settings for the distributed token store
//! - `csrf` - Token lifetime, cleanup, and middleware exemptions
//! - `rate_limit` - Issuance endpoint rate limiting
//! - `server` - HTTP server binding

pub mod cache;
pub mod csrf;
pub mod rate_limit;
pub mod server;

pub use cache::CacheConfig;
pub use csrf::CsrfConfig;
pub use rate_limit::IssueRateLimitConfig;
pub use server::ServerConfig;
