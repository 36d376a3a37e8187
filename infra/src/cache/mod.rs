//! Redis connection handling for the distributed token store

pub mod redis_client;

pub use redis_client::RedisClient;

// Re-export commonly used types
pub use am_shared::config::cache::CacheConfig;
