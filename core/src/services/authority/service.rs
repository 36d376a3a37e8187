//! Token issuance and validation

use rand::{thread_rng, Rng};
use tracing::{debug, warn};

use crate::domain::entities::token::{CsrfToken, TOKEN_VALUE_BYTES};
use crate::errors::{CsrfError, CsrfResult};
use crate::store::TokenStore;

use super::config::AuthorityConfig;

/// Server-side token authority
///
/// Owns no ambient state: one instance is constructed at startup with its
/// store and passed by reference to the middleware and handlers.
pub struct TokenAuthority<S: TokenStore> {
    store: S,
    config: AuthorityConfig,
}

impl<S: TokenStore> TokenAuthority<S> {
    /// Creates an authority over the given store
    pub fn new(store: S, config: AuthorityConfig) -> Self {
        Self { store, config }
    }

    /// Issues a fresh token bound to `session_id`
    ///
    /// Fails with [`CsrfError::NoSession`] for an empty session id; the
    /// authority never issues anonymous tokens. A fraction of calls
    /// (`cleanup_probability`) additionally sweeps expired records out of the
    /// store, bounding the amortized sweep cost.
    pub async fn issue(&self, session_id: &str) -> CsrfResult<CsrfToken> {
        if session_id.trim().is_empty() {
            return Err(CsrfError::NoSession);
        }

        // rng is not Send, so both random draws happen before any await
        let (value, sweep) = {
            let mut rng = thread_rng();
            let bytes: [u8; TOKEN_VALUE_BYTES] = rng.gen();
            let sweep = rng.gen::<f64>() < self.config.cleanup_probability;
            (hex::encode(bytes), sweep)
        };

        let token = CsrfToken::new(
            value,
            session_id.to_string(),
            self.config.token_lifetime,
        );
        self.store.put(token.clone()).await?;
        debug!(
            token = %token_prefix(&token.value),
            expires_at = %token.expires_at,
            "issued CSRF token"
        );

        if sweep {
            match self.store.purge_expired().await {
                Ok(dropped) if dropped > 0 => {
                    debug!(dropped, "issuance-triggered expiry sweep");
                }
                Ok(_) => {}
                // Sweep failure must not fail the issuance that triggered it
                Err(e) => warn!(error = %e, "expiry sweep failed"),
            }
        }

        Ok(token)
    }

    /// Validates `token_value` for the request's `session_id`
    ///
    /// Fails closed: an empty token or session, an unknown token, an expired
    /// token, or a session mismatch all yield `Ok(false)`. Expired records are
    /// deleted on the spot so they can never match again. Store transport
    /// errors propagate; callers map them to rejection.
    pub async fn validate(&self, token_value: &str, session_id: &str) -> CsrfResult<bool> {
        if token_value.is_empty() || session_id.is_empty() {
            return Ok(false);
        }

        let token = match self.store.get(token_value).await? {
            Some(token) => token,
            None => {
                debug!(token = %token_prefix(token_value), "unknown CSRF token");
                return Ok(false);
            }
        };

        if token.is_expired() {
            // Remove immediately: an expired token must never be matchable again
            self.store.delete(token_value).await?;
            debug!(token = %token_prefix(token_value), "rejected expired CSRF token");
            return Ok(false);
        }

        if !token.matches_session(session_id) {
            warn!(
                token = %token_prefix(token_value),
                "CSRF token presented under a different session"
            );
            return Ok(false);
        }

        if self.config.single_use {
            self.store.delete(token_value).await?;
        }

        Ok(true)
    }

    /// The active configuration
    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }
}

/// First 8 bytes of a token value, safe to log
///
/// The value is caller-supplied and not necessarily hex, so the cut must
/// respect char boundaries.
fn token_prefix(value: &str) -> &str {
    value.get(..8).unwrap_or(value)
}
