//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the services built on top of it
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices, jwt_secret: String) -> Router {
    let jwt = Arc::new(stockledger_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: the bearer token is checked before the services are
    // attached, so unauthenticated requests never reach a handler.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(Arc::new(services))),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
