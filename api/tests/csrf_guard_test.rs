//! Integration tests for the CSRF guard middleware

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::{test, web, App, HttpResponse};
use serde_json::Value;

use am_api::middleware::CsrfGuard;
use am_api::CsrfState;
use am_core::{MemoryStore, TokenStore};
use am_shared::config::{CsrfConfig, IssueRateLimitConfig};
use am_shared::protocol::{CSRF_HEADER, SESSION_COOKIE};

fn test_state(csrf: CsrfConfig) -> web::Data<CsrfState> {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::new());
    web::Data::new(CsrfState::new(store, csrf, IssueRateLimitConfig::default()))
}

/// Echoes the JSON body back, proving the guard hands it through intact.
async fn echo(body: web::Json<Value>) -> HttpResponse {
    HttpResponse::Ok().json(body.into_inner())
}

async fn ok() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

macro_rules! guarded_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(CsrfGuard)
                .route("/api/v1/profile", web::post().to(echo))
                .route("/api/v1/profile", web::get().to(ok))
                .route("/api/v1/webhook", web::post().to(ok)),
        )
        .await
    };
}

fn session_cookie(value: &str) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, value.to_string())
}

#[actix_web::test]
async fn rejects_state_change_without_session_cookie() {
    let state = test_state(CsrfConfig::default());
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .set_json(serde_json::json!({"name": "amora"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SESSION_TOKEN_MISSING");
}

#[actix_web::test]
async fn rejects_state_change_without_token() {
    let state = test_state(CsrfConfig::default());
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-1"))
        .set_json(serde_json::json!({"name": "amora"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CSRF_TOKEN_MISSING");
}

#[actix_web::test]
async fn rejects_unknown_token() {
    let state = test_state(CsrfConfig::default());
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-1"))
        .insert_header((CSRF_HEADER, "a".repeat(64)))
        .set_json(serde_json::json!({"name": "amora"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CSRF_TOKEN_INVALID");
}

#[actix_web::test]
async fn accepts_valid_token_in_header() {
    let state = test_state(CsrfConfig::default());
    let token = state.authority.issue("sess-1").await.unwrap();
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-1"))
        .insert_header((CSRF_HEADER, token.value))
        .set_json(serde_json::json!({"name": "amora"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn accepts_token_in_json_body_and_preserves_payload() {
    let state = test_state(CsrfConfig::default());
    let token = state.authority.issue("sess-1").await.unwrap();
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-1"))
        .set_json(serde_json::json!({
            "csrfToken": token.value,
            "name": "amora",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    // The handler must still see the full body after the guard peeked at it.
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "amora");
}

#[actix_web::test]
async fn body_fallback_gives_up_on_oversized_payloads() {
    let state = test_state(CsrfConfig::default());
    let token = state.authority.issue("sess-1").await.unwrap();
    let app = guarded_app!(state);

    // Well past the 64 KiB peek limit; even a valid token in the body must
    // not be honoured, only the header channel works at this size
    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-1"))
        .set_json(serde_json::json!({
            "csrfToken": token.value,
            "bio": "x".repeat(128 * 1024),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CSRF_TOKEN_MISSING");
}

#[actix_web::test]
async fn rejects_token_bound_to_another_session() {
    let state = test_state(CsrfConfig::default());
    let token = state.authority.issue("sess-1").await.unwrap();
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-2"))
        .insert_header((CSRF_HEADER, token.value))
        .set_json(serde_json::json!({"name": "amora"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CSRF_TOKEN_INVALID");
}

#[actix_web::test]
async fn rejects_expired_token() {
    let config = CsrfConfig {
        token_lifetime_secs: 0,
        ..CsrfConfig::default()
    };
    let state = test_state(config);
    let token = state.authority.issue("sess-1").await.unwrap();
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/profile")
        .cookie(session_cookie("sess-1"))
        .insert_header((CSRF_HEADER, token.value))
        .set_json(serde_json::json!({"name": "amora"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn safe_methods_pass_without_token() {
    let state = test_state(CsrfConfig::default());
    let app = guarded_app!(state);

    let req = test::TestRequest::get().uri("/api/v1/profile").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn exempt_path_passes_without_token() {
    let config = CsrfConfig::default().with_exempt_path("/api/v1/webhook");
    let state = test_state(config);
    let app = guarded_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/webhook")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn single_use_token_fails_second_validation() {
    let config = CsrfConfig {
        single_use: true,
        ..CsrfConfig::default()
    };
    let state = test_state(config);
    let token = state.authority.issue("sess-1").await.unwrap();
    let app = guarded_app!(state);

    for expected in [200u16, 403] {
        let req = test::TestRequest::post()
            .uri("/api/v1/profile")
            .cookie(session_cookie("sess-1"))
            .insert_header((CSRF_HEADER, token.value.clone()))
            .set_json(serde_json::json!({"name": "amora"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }
}
