//! Client-side token cache
//!
//! One instance per client. Holds the last issued token, a rate-limit
//! cooldown, and serializes token acquisition so a burst of concurrent
//! requests produces exactly one issuance call.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::transport::CsrfTransport;

/// Backoff policy for rate-limited issuance attempts
///
/// The backoff applies to retries *within* one acquisition; the cooldown
/// recorded after a failed acquisition suppresses *separate* acquisitions
/// until it elapses.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// First retry delay
    pub base: Duration,
    /// Delay cap
    pub cap: Duration,
    /// Issuance attempts per acquisition before giving up
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(8),
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    token: Option<CachedToken>,
    rate_limited_until: Option<Instant>,
}

/// Token cache with issuance dedup and rate-limit cooldown
pub struct TokenCache {
    state: Mutex<CacheState>,
    backoff: BackoffConfig,
    /// Tokens this close to expiry are treated as already expired, so a
    /// request never leaves with a token that dies in flight
    refresh_margin: Duration,
}

impl TokenCache {
    pub fn new(backoff: BackoffConfig) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            backoff,
            refresh_margin: Duration::from_secs(5),
        }
    }

    /// Returns the cached token value, fetching a fresh one if necessary
    ///
    /// Acquisition is serialized through the state lock: under a burst of N
    /// concurrent callers, the first fetches and every other caller finds the
    /// fresh token when its turn comes, so exactly one issuance call reaches
    /// the authority.
    pub async fn token<T: CsrfTransport>(&self, transport: &T) -> Result<String, ClientError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        // Local expiry check first: an expired cached token must not cause a
        // doomed round-trip
        if let Some(cached) = &state.token {
            if cached.expires_at > now + self.refresh_margin {
                return Ok(cached.value.clone());
            }
            debug!("cached CSRF token expired locally");
            state.token = None;
        }

        if let Some(until) = state.rate_limited_until {
            if until > now {
                return Err(ClientError::RateLimited {
                    retry_after: Some(until - now),
                });
            }
            state.rate_limited_until = None;
        }

        let mut delay = self.backoff.base;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match transport.fetch_token().await {
                Ok(issued) => {
                    let expires_at = Instant::now() + Duration::from_millis(issued.expires_in_ms);
                    state.token = Some(CachedToken {
                        value: issued.value.clone(),
                        expires_at,
                    });
                    return Ok(issued.value);
                }
                Err(ClientError::RateLimited { retry_after })
                    if attempt < self.backoff.max_attempts =>
                {
                    let wait = retry_after.unwrap_or(delay);
                    warn!(attempt, wait_ms = wait.as_millis() as u64, "issuance rate limited, backing off");
                    sleep(wait).await;
                    delay = (delay * 2).min(self.backoff.cap);
                }
                Err(ClientError::RateLimited { retry_after }) => {
                    // Out of attempts: record the cooldown so separate
                    // acquisitions stay quiet until it elapses
                    let cooldown = retry_after.unwrap_or(delay);
                    state.rate_limited_until = Some(Instant::now() + cooldown);
                    warn!(cooldown_ms = cooldown.as_millis() as u64, "issuance cooldown recorded");
                    return Err(ClientError::RateLimited {
                        retry_after: Some(cooldown),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Drops the cached token if it is the one the server just rejected
    ///
    /// The value check prevents a stale rejection from discarding a token a
    /// concurrent acquisition fetched in the meantime.
    pub async fn invalidate(&self, rejected_value: &str) {
        let mut state = self.state.lock().await;
        if let Some(cached) = &state.token {
            if cached.value == rejected_value {
                state.token = None;
                debug!("dropped rejected CSRF token");
            }
        }
    }

    /// The currently cached value, if any (does not trigger a fetch)
    pub async fn cached_value(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.token.as_ref().map(|t| t.value.clone())
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
