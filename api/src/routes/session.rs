//! Session bootstrap shim for the legacy webview flow.
//!
//! Older app builds open the webview with the session in a `?session=` query
//! parameter instead of a cookie. This endpoint moves the value into the
//! `amora_session` cookie and redirects to the requested page with the
//! parameter stripped, so the session never lingers in a URL.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use am_shared::errors::error_codes;
use am_shared::protocol::SESSION_COOKIE;

use crate::dto::error_response;
use crate::state::CsrfState;

#[derive(Debug, Deserialize)]
pub struct BootstrapQuery {
    /// Legacy session value carried in the URL
    pub session: Option<String>,
    /// Where to send the browser afterwards (relative paths only)
    pub redirect: Option<String>,
}

/// `GET /api/v1/session/bootstrap`
pub async fn bootstrap(
    query: web::Query<BootstrapQuery>,
    state: web::Data<CsrfState>,
) -> HttpResponse {
    let session = match query.session.as_deref().filter(|s| !s.is_empty()) {
        Some(session) => session.to_string(),
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                error_codes::SESSION_TOKEN_MISSING,
                "No session parameter to bootstrap from",
            );
        }
    };

    let redirect = sanitize_redirect(query.redirect.as_deref());
    debug!(redirect = %redirect, "bootstrapping session cookie from legacy parameter");

    let cookie = Cookie::build(SESSION_COOKIE, session)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.csrf.secure_cookies)
        .finish();

    HttpResponse::Found()
        .cookie(cookie)
        .insert_header((header::LOCATION, redirect))
        .finish()
}

/// Only same-site relative paths are honoured; anything else falls back to
/// the root so the endpoint cannot be used as an open redirect.
fn sanitize_redirect(redirect: Option<&str>) -> String {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}
