//! Integration tests for token issuance and session bootstrap

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{test, web};
use serde_json::Value;

use am_api::{create_app, CsrfState};
use am_core::{MemoryStore, TokenStore};
use am_shared::config::{CsrfConfig, IssueRateLimitConfig};
use am_shared::protocol::{CSRF_HEADER, CSRF_TOKEN_PATH, SESSION_COOKIE};

fn test_state(csrf: CsrfConfig, rate_limit: IssueRateLimitConfig) -> web::Data<CsrfState> {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::new());
    web::Data::new(CsrfState::new(store, csrf, rate_limit))
}

fn session_cookie(value: &str) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, value.to_string())
}

#[actix_web::test]
async fn issuance_requires_session_cookie() {
    let state = test_state(CsrfConfig::default(), IssueRateLimitConfig::default());
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri(CSRF_TOKEN_PATH).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SESSION_TOKEN_MISSING");
}

#[actix_web::test]
async fn issuance_returns_token_with_cache_suppression() {
    let state = test_state(CsrfConfig::default(), IssueRateLimitConfig::default());
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri(CSRF_TOKEN_PATH)
        .cookie(session_cookie("sess-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let cache_control = resp
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cache_control.contains("no-store"));

    let body: Value = test::read_body_json(resp).await;
    let token = body["csrfToken"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(body["expiresIn"], 3_600_000);
}

#[actix_web::test]
async fn issued_token_passes_the_guard() {
    let state = test_state(CsrfConfig::default(), IssueRateLimitConfig::default());
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri(CSRF_TOKEN_PATH)
        .cookie(session_cookie("sess-1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["csrfToken"].as_str().unwrap().to_string();

    // No POST routes are registered, so clearing the guard lands on the 404
    // default handler instead of a 403.
    let req = test::TestRequest::post()
        .uri("/api/v1/unknown")
        .cookie(session_cookie("sess-1"))
        .insert_header((CSRF_HEADER, token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::post()
        .uri("/api/v1/unknown")
        .cookie(session_cookie("sess-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn issuance_is_rate_limited_per_session() {
    let rate_limit = IssueRateLimitConfig {
        enabled: true,
        max_per_window: 2,
        window_secs: 60,
    };
    let state = test_state(CsrfConfig::default(), rate_limit);
    let app = test::init_service(create_app(state)).await;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri(CSRF_TOKEN_PATH)
            .cookie(session_cookie("sess-1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let req = test::TestRequest::get()
        .uri(CSRF_TOKEN_PATH)
        .cookie(session_cookie("sess-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "RATE_LIMITED");

    // A different session is unaffected.
    let req = test::TestRequest::get()
        .uri(CSRF_TOKEN_PATH)
        .cookie(session_cookie("sess-2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn bootstrap_moves_session_param_into_cookie() {
    let state = test_state(CsrfConfig::default(), IssueRateLimitConfig::default());
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/session/bootstrap?session=legacy-sess&redirect=/matches")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/matches")
    );

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(set_cookie.contains("amora_session=legacy-sess"));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
}

#[actix_web::test]
async fn bootstrap_ignores_external_redirects() {
    let state = test_state(CsrfConfig::default(), IssueRateLimitConfig::default());
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/session/bootstrap?session=legacy-sess&redirect=https://evil.example")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );
}

#[actix_web::test]
async fn bootstrap_without_session_param_is_unauthorized() {
    let state = test_state(CsrfConfig::default(), IssueRateLimitConfig::default());
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/session/bootstrap?redirect=/matches")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
}
