//! Token store abstraction
//!
//! The authority persists tokens through this trait. Two production backends
//! exist: the in-process [`MemoryStore`] here and the redis-backed store in
//! the infrastructure crate. A single request is served entirely by one
//! backend; mixing backends within one operation would allow inconsistent
//! expiry judgments.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entities::token::CsrfToken;
use crate::errors::StoreError;

mod memory;


pub use memory::MemoryStore;

/// Key-value persistence contract for CSRF tokens
///
/// Keys are token values. Backends with native per-key expiry may implement
/// `purge_expired` as a no-op.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fetch a token record by value
    ///
    /// Returns `Ok(None)` when no record exists. Backends with native expiry
    /// also return `Ok(None)` for records their TTL already removed.
    async fn get(&self, value: &str) -> Result<Option<CsrfToken>, StoreError>;

    /// Store a token record, applying a TTL derived from its `expires_at`
    async fn put(&self, token: CsrfToken) -> Result<(), StoreError>;

    /// Delete a token record
    ///
    /// Returns `Ok(true)` if a record was removed, `Ok(false)` if none existed.
    async fn delete(&self, value: &str) -> Result<bool, StoreError>;

    /// Remove expired records, returning how many were dropped
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    async fn get(&self, value: &str) -> Result<Option<CsrfToken>, StoreError> {
        (**self).get(value).await
    }

    async fn put(&self, token: CsrfToken) -> Result<(), StoreError> {
        (**self).put(token).await
    }

    async fn delete(&self, value: &str) -> Result<bool, StoreError> {
        (**self).delete(value).await
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        (**self).purge_expired().await
    }
}
