//! Token store backends

mod fallback;
mod redis_store;

#[cfg(test)]
mod tests;

pub use fallback::FallbackStore;
pub use redis_store::RedisStore;
