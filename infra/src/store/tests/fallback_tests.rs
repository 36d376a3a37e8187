//! Unit tests for the fallback store

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Duration;

use am_core::{CsrfToken, MemoryStore, StoreError, TokenStore};

use crate::store::FallbackStore;

/// Primary store whose transport can be switched off
struct FlakyPrimary {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyPrimary {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            down: AtomicBool::new(false),
        }
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Transport {
                message: "connection refused".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TokenStore for FlakyPrimary {
    async fn get(&self, value: &str) -> Result<Option<CsrfToken>, StoreError> {
        self.check()?;
        self.inner.get(value).await
    }

    async fn put(&self, token: CsrfToken) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(token).await
    }

    async fn delete(&self, value: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete(value).await
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.purge_expired().await
    }
}

fn token(value: &str) -> CsrfToken {
    CsrfToken::new(
        value.to_string(),
        "session-1".to_string(),
        Duration::seconds(60),
    )
}

#[tokio::test]
async fn healthy_primary_serves_the_call() {
    let store = FallbackStore::new(FlakyPrimary::new());
    store.put(token("tok-1")).await.unwrap();

    assert!(store.get("tok-1").await.unwrap().is_some());
    // Nothing leaked into the fallback map
    assert!(store.fallback().is_empty());
}

#[tokio::test]
async fn transport_failure_degrades_the_whole_call() {
    let primary = FlakyPrimary::new();
    primary.set_down(true);
    let store = FallbackStore::new(primary);

    store.put(token("tok-1")).await.unwrap();
    let fetched = store.get("tok-1").await.unwrap();
    assert_eq!(fetched.unwrap().value, "tok-1");
    assert_eq!(store.fallback().len(), 1);

    assert!(store.delete("tok-1").await.unwrap());
    assert!(store.fallback().is_empty());
}

#[tokio::test]
async fn recovered_primary_is_used_again() {
    let primary = std::sync::Arc::new(FlakyPrimary::new());
    primary.set_down(true);
    let store = FallbackStore::new(std::sync::Arc::clone(&primary));

    // Written while degraded: lands in the fallback map
    store.put(token("degraded")).await.unwrap();

    // Primary back up: reads go to it entirely, so the degraded-era record
    // is not visible through it
    primary.set_down(false);
    assert!(store.get("degraded").await.unwrap().is_none());

    store.put(token("fresh")).await.unwrap();
    assert!(store.get("fresh").await.unwrap().is_some());
}

#[tokio::test]
async fn sweep_covers_the_fallback_map() {
    let primary = FlakyPrimary::new();
    primary.set_down(true);
    let store = FallbackStore::new(primary);

    let expired = CsrfToken::new(
        "dead".to_string(),
        "session-1".to_string(),
        Duration::seconds(-1),
    );
    store.put(expired).await.unwrap();

    let dropped = store.purge_expired().await.unwrap();
    assert_eq!(dropped, 1);
    assert!(store.fallback().is_empty());
}
