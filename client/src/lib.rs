//! # Amora Client
//!
//! Request interceptor for the Amora API. Application code sends every
//! same-origin state-changing request through [`CsrfClient`], which caches the
//! current CSRF token, deduplicates concurrent issuance calls, attaches the
//! token header, and transparently retries once after a token rejection.
//!
//! There is no background refresh: a token is re-fetched lazily by the next
//! outgoing request after local expiry or a server-side rejection.

pub mod cache;
pub mod error;
pub mod interceptor;
pub mod transport;


pub use cache::{BackoffConfig, TokenCache};
pub use error::ClientError;
pub use interceptor::{bootstrap_session_from_url, is_same_origin, CsrfClient, HttpCsrfClient};
pub use transport::{CsrfTransport, HttpTransport, IssuedToken, TransportRequest, TransportResponse};
