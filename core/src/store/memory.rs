//! In-process token store

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::entities::token::CsrfToken;
use crate::errors::StoreError;

use super::TokenStore;

/// Mutex-guarded in-process token map
///
/// The fallback backend for single-process deployments and for degraded
/// operation when redis is unreachable. The map has no native expiry, so the
/// authority's probabilistic sweep calls `purge_expired` here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<String, CsrfToken>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired or not (for monitoring)
    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    /// True when no records are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, value: &str) -> Result<Option<CsrfToken>, StoreError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.get(value).cloned())
    }

    async fn put(&self, token: CsrfToken) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(token.value.clone(), token);
        Ok(())
    }

    async fn delete(&self, value: &str) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        Ok(tokens.remove(value).is_some())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired());
        let dropped = before - tokens.len();
        if dropped > 0 {
            debug!(dropped, remaining = tokens.len(), "purged expired tokens");
        }
        Ok(dropped)
    }
}
