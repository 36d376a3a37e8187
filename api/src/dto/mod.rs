//! Request and response DTOs for the HTTP layer.

pub mod csrf;
pub mod error;

pub use csrf::CsrfTokenResponse;
pub use error::error_response;
