//! Middleware for the Amora API.

pub mod cors;
pub mod csrf;

pub use cors::create_cors;
pub use csrf::CsrfGuard;
