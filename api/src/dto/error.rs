//! Error response construction shared by routes and middleware.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use am_shared::errors::ErrorResponse;

/// Build a JSON error response with the standard envelope.
///
/// Every rejection the CSRF layer produces goes through here so clients see
/// one shape regardless of which check failed.
pub fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(code, message))
}
