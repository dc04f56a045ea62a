//! Application routing
//!
//! This module defines all HTTP routes for the gateway.

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, proxy};
use crate::middleware::logging::log_request;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes (no authentication required)
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    // Proxy routes resolve the caller themselves; an unauthenticated
    // request is still forwarded, just without tenant headers
    let proxy_routes = Router::new()
        .route("/api/kms", any(proxy::kms))
        .route("/api/kms/*path", any(proxy::kms))
        .route("/api/compute", any(proxy::compute))
        .route("/api/compute/*path", any(proxy::compute))
        .route("/api/agents", any(proxy::agents))
        .route("/api/agents/*path", any(proxy::agents))
        .route("/api/zap/zt", any(proxy::zero_trust))
        .route("/api/zap/zt/*path", any(proxy::zero_trust));

    Router::new()
        .merge(proxy_routes)
        .merge(health_routes)
        // Apply middleware layers (last added = outermost = runs first)
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// CORS layer exposing the trace id headers
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            axum::http::HeaderName::from_static("x-trace-id"),
            axum::http::HeaderName::from_static("x-request-id"),
        ])
}
