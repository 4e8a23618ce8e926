//! achieving_api Library
//!
//! Goal tracking and monthly budgeting backend. Re-exports modules for the
//! server binary and integration tests.

use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderValue, Method,
    },
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod goals;
pub mod ledger;
pub mod state;

mod error;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use state::AppState;

/// CORS preflight cache lifetime
const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Build the application router
///
/// `allow_origin` is the single origin allowed by CORS; `None` disables
/// cross-origin access.
pub fn build_router(state: AppState, allow_origin: Option<HeaderValue>) -> Router {
    let cors = match allow_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true)
            .max_age(CORS_MAX_AGE),
        None => CorsLayer::new(),
    };

    // Layers run outermost-first from the bottom: request ids are assigned
    // before tracing and logging see the request.
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::create_router(state.clone()))
        .layer(middleware::from_fn(api::middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}
