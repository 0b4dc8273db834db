//! Payment intent and subscription creation.

use axum::{Json, body::Bytes, extract::State};
use paylink_billing::create_checkout;
use paylink_core::{CheckoutResponse, CreationRequest};
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /create-payment-intent`
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let request = CreationRequest::from_slice(&body)?;

    let response = create_checkout(state.provider.as_ref(), &state.prices, &request)
        .await
        .inspect_err(|e| {
            if !e.is_client_error() {
                error!(error = %e, plan = ?request.plan(), "Payment creation failed");
            }
        })?;

    Ok(Json(response))
}
