//! Redis-backed token store

use async_trait::async_trait;

use am_core::{CsrfToken, StoreError, TokenStore};

use crate::cache::RedisClient;
use crate::InfraError;

/// Token store over redis, using native per-key expiry
///
/// Records are stored as JSON under `csrf:<token value>` (prefix
/// configurable) with `EX` set from the token's remaining lifetime, so
/// expired records vanish without any sweeping.
pub struct RedisStore {
    client: RedisClient,
    key_prefix: String,
}

impl RedisStore {
    /// Create a store over an established redis client
    pub fn new(client: RedisClient) -> Self {
        Self::with_prefix(client, "csrf")
    }

    /// Create a store with a custom key prefix
    pub fn with_prefix(client: RedisClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: prefix.into(),
        }
    }

    fn key(&self, value: &str) -> String {
        format!("{}:{}", self.key_prefix, value)
    }
}

fn transport(e: InfraError) -> StoreError {
    StoreError::Transport {
        message: e.to_string(),
    }
}

#[async_trait]
impl TokenStore for RedisStore {
    async fn get(&self, value: &str) -> Result<Option<CsrfToken>, StoreError> {
        let raw = self.client.get(&self.key(value)).await.map_err(transport)?;
        match raw {
            Some(json) => {
                let token =
                    serde_json::from_str(&json).map_err(|e| StoreError::Serialization {
                        message: e.to_string(),
                    })?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, token: CsrfToken) -> Result<(), StoreError> {
        let json = serde_json::to_string(&token).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        // TTL below one second would mean EX 0, which redis rejects
        let ttl_secs = token.remaining_ttl().num_seconds().max(1) as u64;
        self.client
            .set_with_expiry(&self.key(&token.value), &json, ttl_secs)
            .await
            .map_err(transport)
    }

    async fn delete(&self, value: &str) -> Result<bool, StoreError> {
        self.client.delete(&self.key(value)).await.map_err(transport)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        // Native per-key expiry makes a sweep unnecessary
        Ok(0)
    }
}
