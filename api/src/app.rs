//! Application factory.
//!
//! Wires the shared state, middleware stack, and routes into an Actix-web
//! application. Tests build the same app the binary runs.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, Error, HttpResponse};
use tracing_actix_web::TracingLogger;

use am_shared::errors::{error_codes, ErrorResponse};

use crate::middleware::{create_cors, CsrfGuard};
use crate::routes;
use crate::state::CsrfState;

/// Create and configure the application with all dependencies.
pub fn create_app(
    state: web::Data<CsrfState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let cors = create_cors();

    App::new()
        .app_data(state)
        // Middleware run outermost-last: logging, then CORS, then the guard
        // closest to the handlers.
        .wrap(CsrfGuard)
        .wrap(cors)
        .wrap(TracingLogger::default())
        // Health check endpoint
        .route("/health", web::get().to(health_check))
        // API v1 routes
        .service(
            web::scope("/api/v1")
                .route("/csrf-token", web::get().to(routes::csrf::issue_token))
                .route(
                    "/session/bootstrap",
                    web::get().to(routes::session::bootstrap),
                ),
        )
        // Default 404 handler
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "amora-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
