//! # Amora Infrastructure
//!
//! Redis-backed implementation of the token store, plus the fallback wrapper
//! that degrades to the in-process map when redis is unreachable.

pub mod cache;
pub mod store;

use thiserror::Error;

pub use cache::RedisClient;
pub use store::{FallbackStore, RedisStore};

/// Infrastructure layer errors
#[derive(Error, Debug)]
pub enum InfraError {
    /// Invalid configuration (e.g. malformed redis URL)
    #[error("configuration error: {0}")]
    Config(String),

    /// Redis operation failed
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
}
