//! Token issuance endpoint.

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{debug, error};

use am_core::{CsrfError, RateLimitDecision};
use am_shared::errors::{error_codes, ErrorResponse};
use am_shared::protocol::SESSION_COOKIE;

use crate::dto::{error_response, CsrfTokenResponse};
use crate::state::CsrfState;

/// `GET /api/v1/csrf-token`
///
/// Issues a fresh token bound to the caller's session. Responses are marked
/// non-cacheable so a shared cache never hands one session's token to
/// another.
pub async fn issue_token(req: HttpRequest, state: web::Data<CsrfState>) -> HttpResponse {
    let session_id = match req.cookie(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                error_codes::SESSION_TOKEN_MISSING,
                "A session is required before a CSRF token can be issued",
            );
        }
    };

    if let RateLimitDecision::Limited { retry_after_secs } = state.limiter.check(&session_id) {
        debug!(retry_after_secs, "token issuance rate limited");
        return HttpResponse::TooManyRequests()
            .insert_header((header::RETRY_AFTER, retry_after_secs.to_string()))
            .json(
                ErrorResponse::new(
                    error_codes::RATE_LIMITED,
                    "Too many token requests for this session",
                )
                .add_detail("retry_after_secs", retry_after_secs),
            );
    }

    match state.authority.issue(&session_id).await {
        Ok(token) => HttpResponse::Ok()
            .insert_header((header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"))
            .insert_header((header::PRAGMA, "no-cache"))
            .json(CsrfTokenResponse {
                csrf_token: token.value,
                expires_in: state.csrf.token_lifetime_ms(),
            }),
        Err(CsrfError::NoSession) => error_response(
            StatusCode::UNAUTHORIZED,
            error_codes::SESSION_TOKEN_MISSING,
            "A session is required before a CSRF token can be issued",
        ),
        Err(err) => {
            error!(error = %err, "token issuance failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Could not issue a CSRF token",
            )
        }
    }
}
