//! Client-side error types

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to callers of the request interceptor
#[derive(Error, Debug)]
pub enum ClientError {
    /// Issuance rejected because the user is not logged in; not retried
    #[error("no session available for token issuance")]
    NoSession,

    /// Issuance is rate limited; retry after the cooldown elapses
    #[error("token issuance rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// The request was rejected again after a fresh token was attached
    #[error("request rejected twice, giving up")]
    Rejected,

    /// The server reported the session itself gone; surfaced to the user,
    /// never retried automatically
    #[error("session expired")]
    SessionExpired,

    /// Network-level failure
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Issuance response could not be understood
    #[error("invalid issuance response: {message}")]
    InvalidResponse { message: String },
}
