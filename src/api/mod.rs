//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::{extract::State, http::HeaderName, http::StatusCode, routing::get, Router};
use sqlx::PgPool;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use routes::create_router;

/// Build the full application router.
///
/// Layers run outermost first: request id, trace, request logging, then API
/// key authentication on everything under `/api/v1`.
pub fn build_router(pool: PgPool) -> Router {
    let correlation_header = HeaderName::from_static(middleware::CORRELATION_ID_HEADER);

    let protected_routes = create_router().layer(axum::middleware::from_fn_with_state(
        pool.clone(),
        middleware::auth_middleware,
    ));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .nest("/api/v1", protected_routes)
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(correlation_header.clone()))
        .layer(SetRequestIdLayer::new(correlation_header, MakeRequestUuid))
        .with_state(pool)
}

/// Health check endpoint
async fn health_check(State(pool): State<PgPool>) -> (StatusCode, &'static str) {
    match crate::db::verify_connection(&pool).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "DATABASE UNAVAILABLE")
        }
    }
}
