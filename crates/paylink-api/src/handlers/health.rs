//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `signed`, `unverified` or `disabled`.
    pub webhooks: &'static str,
    pub subscriptions_enabled: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        webhooks: state.webhook_mode(),
        subscriptions_enabled: state.prices.is_configured(),
    })
}

pub async fn ready() -> StatusCode {
    StatusCode::OK
}
