//! API route definitions.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, payments, webhooks};
use crate::middleware;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .route("/webhook", post(webhooks::webhook))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(state)
}

/// Router with tracing, request IDs and CORS applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    create_router(state).layer(
        ServiceBuilder::new()
            .layer(middleware::cors_layer())
            .layer(axum::middleware::from_fn(middleware::request_id))
            .layer(TraceLayer::new_for_http()),
    )
}
