//! Error types for the CSRF protection domain
//!
//! Fail-closed is the governing principle: every variant here maps to a
//! rejection somewhere up the stack, never to a silent pass.

use thiserror::Error;

/// Token store failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network-level failure talking to the backing store
    #[error("store transport failure: {message}")]
    Transport { message: String },

    /// Stored record could not be encoded or decoded
    #[error("store serialization failure: {message}")]
    Serialization { message: String },
}

/// CSRF protection errors
#[derive(Error, Debug)]
pub enum CsrfError {
    /// Issuance requested with no session context
    #[error("no session supplied for token issuance")]
    NoSession,

    /// Checked request carried no token at all
    #[error("request carried no CSRF token")]
    TokenMissing,

    /// Token absent from the store, expired, or session-mismatched
    #[error("CSRF token invalid")]
    TokenInvalid,

    /// Too many issuance attempts
    #[error("token issuance rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CsrfResult<T> = Result<T, CsrfError>;
