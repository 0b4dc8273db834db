//! Stripe webhook endpoint.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use paylink_billing::{SIGNATURE_HEADER, WebhookError, process_webhook};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// `POST /webhook`
///
/// Takes the raw body; the signature covers the exact bytes Stripe sent.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = state
        .webhook_verifier
        .as_ref()
        .ok_or(WebhookError::NotConfigured)
        .and_then(|verifier| verifier.construct_event(&body, signature))
        .inspect_err(|e| warn!(error = %e, "Webhook signature verification failed"))?;

    if let Err(e) = process_webhook(state.webhook_handler.as_ref(), &event).await {
        error!(event_type = %event.event_type, error = %e, "Webhook handler failed");
    }

    Ok(Json(WebhookAck { received: true }))
}
