//! Degrading wrapper over a primary and an in-process store

use async_trait::async_trait;
use tracing::warn;

use am_core::{CsrfToken, MemoryStore, StoreError, TokenStore};

/// Routes each call entirely to the primary store, degrading the whole call to
/// the in-process map on transport failure
///
/// One call never mixes backends: a `get` that fails over reads only the
/// memory map, so its expiry judgment is consistent. Serialization errors are
/// not degraded; they indicate corrupt data, not an unreachable backend.
pub struct FallbackStore<P: TokenStore> {
    primary: P,
    fallback: MemoryStore,
}

impl<P: TokenStore> FallbackStore<P> {
    /// Wrap a primary store with a fresh in-process fallback
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: MemoryStore::new(),
        }
    }

    /// The in-process fallback map (for monitoring)
    pub fn fallback(&self) -> &MemoryStore {
        &self.fallback
    }
}

fn is_transport(e: &StoreError) -> bool {
    matches!(e, StoreError::Transport { .. })
}

#[async_trait]
impl<P: TokenStore> TokenStore for FallbackStore<P> {
    async fn get(&self, value: &str) -> Result<Option<CsrfToken>, StoreError> {
        match self.primary.get(value).await {
            Err(e) if is_transport(&e) => {
                warn!(error = %e, "primary store unreachable, reading fallback");
                self.fallback.get(value).await
            }
            other => other,
        }
    }

    async fn put(&self, token: CsrfToken) -> Result<(), StoreError> {
        match self.primary.put(token.clone()).await {
            Err(e) if is_transport(&e) => {
                warn!(error = %e, "primary store unreachable, writing fallback");
                self.fallback.put(token).await
            }
            other => other,
        }
    }

    async fn delete(&self, value: &str) -> Result<bool, StoreError> {
        match self.primary.delete(value).await {
            Err(e) if is_transport(&e) => {
                warn!(error = %e, "primary store unreachable, deleting from fallback");
                self.fallback.delete(value).await
            }
            other => other,
        }
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        // The fallback map is the only backend that accumulates expired
        // records, so the sweep always covers it
        let fallback_dropped = self.fallback.purge_expired().await?;
        match self.primary.purge_expired().await {
            Ok(primary_dropped) => Ok(primary_dropped + fallback_dropped),
            Err(e) if is_transport(&e) => Ok(fallback_dropped),
            Err(e) => Err(e),
        }
    }
}
