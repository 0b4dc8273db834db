//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use paylink_billing::WebhookError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    Checkout(paylink_core::Error),
    Webhook(WebhookError),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<paylink_core::Error> for ApiError {
    fn from(err: paylink_core::Error) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Checkout(err) => {
                let status = if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (
                    status,
                    Json(ErrorBody {
                        error: err.to_string(),
                    }),
                )
                    .into_response()
            }
            ApiError::Webhook(err) => {
                (StatusCode::BAD_REQUEST, format!("Webhook Error: {}", err)).into_response()
            }
        }
    }
}
