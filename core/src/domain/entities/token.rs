//! CSRF token entity

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind each token value (hex-encoded to 64 chars)
pub const TOKEN_VALUE_BYTES: usize = 32;

/// A CSRF token bound to one session for a limited time
///
/// Records are never mutated after issuance; rotation or replacement always
/// means a new record. The stored form (redis value) is the JSON serialization
/// of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken {
    /// Opaque high-entropy token value, unique per issuance
    pub value: String,

    /// Session identifier the token was bound to at issuance
    pub session_id: String,

    /// Timestamp when the token was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,
}

impl CsrfToken {
    /// Creates a token bound to `session_id`, expiring `lifetime` from now
    pub fn new(value: String, session_id: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            value,
            session_id,
            issued_at: now,
            expires_at: now + lifetime,
        }
    }

    /// Checks whether the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Remaining lifetime; zero once expired
    pub fn remaining_ttl(&self) -> Duration {
        (self.expires_at - Utc::now()).max(Duration::zero())
    }

    /// Constant-time comparison of the bound session id against the one
    /// supplied by the validating request
    pub fn matches_session(&self, session_id: &str) -> bool {
        constant_time_eq(self.session_id.as_bytes(), session_id.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_expired() {
        let token = CsrfToken::new(
            "a".repeat(64),
            "session-1".to_string(),
            Duration::seconds(3600),
        );
        assert!(!token.is_expired());
        assert!(token.remaining_ttl() > Duration::seconds(3590));
    }

    #[test]
    fn past_expiry_token_is_expired() {
        let token = CsrfToken::new(
            "a".repeat(64),
            "session-1".to_string(),
            Duration::seconds(-1),
        );
        assert!(token.is_expired());
        assert_eq!(token.remaining_ttl(), Duration::zero());
    }

    #[test]
    fn session_match_is_exact() {
        let token = CsrfToken::new(
            "a".repeat(64),
            "session-1".to_string(),
            Duration::seconds(60),
        );
        assert!(token.matches_session("session-1"));
        assert!(!token.matches_session("session-2"));
        assert!(!token.matches_session(""));
    }

    #[test]
    fn record_round_trips_through_json() {
        let token = CsrfToken::new(
            "b".repeat(64),
            "session-9".to_string(),
            Duration::seconds(60),
        );
        let json = serde_json::to_string(&token).unwrap();
        let back: CsrfToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, back);
    }
}
