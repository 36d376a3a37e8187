//! Shared protocol definitions and configuration for the Amora backend
//!
//! This crate provides the pieces used on both sides of the CSRF wire
//! contract:
//! - Protocol constants (header and cookie names, error codes)
//! - Configuration types
//! - Error response structure shared by all API endpoints

pub mod config;
pub mod errors;
pub mod protocol;

// Re-export commonly used items at crate root
pub use config::{CacheConfig, CsrfConfig, IssueRateLimitConfig, ServerConfig};
pub use errors::{error_codes, ErrorResponse};
