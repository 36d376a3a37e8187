//! # Amora Core
//!
//! Core domain layer for the Amora CSRF protection subsystem.
//! This crate contains the token entity, the token store abstraction with its
//! in-process backend, the token authority that issues and validates tokens,
//! and the error types shared by the server-side layers.

pub mod domain;
pub mod errors;
pub mod services;
pub mod store;

// Re-export commonly used types for convenience
pub use domain::entities::token::CsrfToken;
pub use errors::{CsrfError, CsrfResult, StoreError};
pub use services::authority::{AuthorityConfig, IssueRateLimiter, RateLimitDecision, TokenAuthority};
pub use store::{MemoryStore, TokenStore};
