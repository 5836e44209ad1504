//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection (Postgres vs in-memory) + renderer
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and query-parameter mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the router over env-selected services (tests and dev runs).
pub async fn build_app(jwt_secret: String) -> Router {
    let services = Arc::new(services::build_services().await);
    build_app_with(jwt_secret, services)
}

/// Build the full HTTP router over a caller-owned service handle, so the
/// caller can still reach `AppServices::shutdown` after serving stops.
pub fn build_app_with(jwt_secret: String, services: Arc<services::AppServices>) -> Router {
    let jwt = Arc::new(bims_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: everything except /health requires a valid token.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
