//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api`:
//! - `auth`: register and login (public)
//! - `profile`: home location (bearer token required)
//! - `middleware`: state, errors, token verification

pub mod auth;
pub mod middleware;
pub mod profile;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected_routes = profile::router().route_layer(axum_middleware::from_fn_with_state(
        state,
        middleware::require_auth,
    ));

    Router::new()
        .route("/test", get(test_route))
        .merge(auth::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
///
/// `cors_origin` is either `*` or a single origin.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    let cors = if cors_origin == "*" {
        cors.allow_origin(Any)
    } else {
        let origin = cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;
        cors.allow_origin(origin)
    };

    Ok(Router::new()
        .route("/", get(hello))
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn hello() -> &'static str {
    "Hello, world!"
}

async fn test_route() -> &'static str {
    "Test route is working"
}
