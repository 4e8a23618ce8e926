//! API module
//!
//! HTTP endpoints, extractors and middleware.

pub mod auth_routes;
pub mod extract;
pub mod goal_routes;
pub mod ledger_routes;
pub mod middleware;

use axum::{middleware::from_fn_with_state, Router};

use crate::state::AppState;

/// Create the API router. Everything except register and login sits behind
/// the bearer-token guard.
pub fn create_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(goal_routes::routes())
        .merge(ledger_routes::routes())
        .route_layer(from_fn_with_state(state, middleware::require_auth));

    Router::new()
        .merge(auth_routes::public_routes())
        .merge(protected)
}
