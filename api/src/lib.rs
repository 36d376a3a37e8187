//! HTTP layer for Amora CSRF protection.
//!
//! Exposes the token issuance endpoint, the session bootstrap shim for the
//! legacy mobile webview, and the `CsrfGuard` middleware that verifies
//! state-changing requests before they reach a handler.

pub mod app;
pub mod dto;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use state::CsrfState;
