//! CSRF guard middleware.
//!
//! Verifies every same-origin state-changing request against the token
//! authority before it reaches a handler. Safe methods and exempted paths
//! pass straight through. The guard fails closed: a missing session cookie,
//! a missing token, a store error, anything it cannot positively verify is
//! rejected.
//!
//! The token travels in the `X-CSRF-Token` header; requests from the legacy
//! form flow carry it as a `csrfToken` field in a JSON body instead, so the
//! guard buffers the payload, peeks at the field, and hands the bytes back
//! to the handler untouched.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_http::h1;
use actix_web::body::EitherBody;
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, StatusCode};
use actix_web::{web, Error, HttpMessage, HttpResponse};
use futures_util::future::LocalBoxFuture;
use futures_util::StreamExt;
use tracing::{debug, error, warn};

use am_shared::errors::{error_codes, ErrorResponse};
use am_shared::protocol::{is_state_changing, CSRF_BODY_FIELD, CSRF_HEADER, SESSION_COOKIE};

use crate::state::CsrfState;

/// CSRF guard middleware factory
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// CSRF guard middleware service
pub struct CsrfGuardMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CsrfGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = match req.app_data::<web::Data<CsrfState>>() {
                Some(state) => state.clone(),
                None => {
                    error!("CsrfGuard mounted without CsrfState in app data");
                    return Ok(reject(
                        req,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_codes::INTERNAL_ERROR,
                        "Server misconfiguration",
                    ));
                }
            };

            // Safe methods carry no state change; exempt paths opt out
            // explicitly (token issuance itself, health, session bootstrap).
            if !is_state_changing(req.method().as_str()) || state.csrf.is_exempt(req.path()) {
                let response = service.call(req).await?;
                return Ok(response.map_into_left_body());
            }

            let session_id = match req.cookie(SESSION_COOKIE) {
                Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
                _ => {
                    debug!(path = %req.path(), "state-changing request without session cookie");
                    return Ok(reject(
                        req,
                        StatusCode::UNAUTHORIZED,
                        error_codes::SESSION_TOKEN_MISSING,
                        "No session cookie accompanied the request",
                    ));
                }
            };

            let token = match extract_token(&mut req).await {
                Some(token) => token,
                None => {
                    debug!(path = %req.path(), "state-changing request without CSRF token");
                    return Ok(reject(
                        req,
                        StatusCode::FORBIDDEN,
                        error_codes::CSRF_TOKEN_MISSING,
                        "CSRF token missing from header and body",
                    ));
                }
            };

            match state.authority.validate(&token, &session_id).await {
                Ok(true) => {
                    let response = service.call(req).await?;
                    Ok(response.map_into_left_body())
                }
                Ok(false) => {
                    debug!(path = %req.path(), "CSRF token failed validation");
                    Ok(reject(
                        req,
                        StatusCode::FORBIDDEN,
                        error_codes::CSRF_TOKEN_INVALID,
                        "CSRF token is unknown, expired, or bound to another session",
                    ))
                }
                Err(err) => {
                    // Fail closed rather than wave the request through on a
                    // store outage.
                    warn!(error = %err, "token validation hit a store error");
                    Ok(reject(
                        req,
                        StatusCode::FORBIDDEN,
                        error_codes::CSRF_TOKEN_INVALID,
                        "CSRF token could not be verified",
                    ))
                }
            }
        })
    }
}

/// Largest JSON body the fallback will buffer while looking for the token
/// field. Anything bigger is treated as carrying no token; the header is the
/// supported channel for large requests.
const MAX_BODY_PEEK_BYTES: usize = 64 * 1024;

/// Pull the token from the header, falling back to the `csrfToken` field of a
/// JSON body. The body bytes are re-attached to the request afterwards.
async fn extract_token(req: &mut ServiceRequest) -> Option<String> {
    if let Some(value) = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return Some(value.to_string());
    }

    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return None;
    }

    let mut payload = req.take_payload();
    let mut buf = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        match chunk {
            Ok(bytes) => {
                if buf.len() + bytes.len() > MAX_BODY_PEEK_BYTES {
                    warn!(
                        limit = MAX_BODY_PEEK_BYTES,
                        "request body too large for CSRF token fallback"
                    );
                    return None;
                }
                buf.extend_from_slice(&bytes);
            }
            Err(err) => {
                warn!(error = %err, "failed to read request body for CSRF check");
                return None;
            }
        }
    }
    let body = buf.freeze();

    let token = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get(CSRF_BODY_FIELD)
                .and_then(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
        });

    req.set_payload(bytes_to_payload(body));
    token
}

fn bytes_to_payload(buf: web::Bytes) -> dev::Payload {
    let (_, mut payload) = h1::Payload::create(true);
    payload.unread_data(buf);
    dev::Payload::from(payload)
}

fn reject<B>(
    req: ServiceRequest,
    status: StatusCode,
    code: &str,
    message: &str,
) -> ServiceResponse<EitherBody<B>> {
    let response: HttpResponse = HttpResponse::build(status).json(ErrorResponse::new(code, message));
    req.into_response(response).map_into_right_body()
}
