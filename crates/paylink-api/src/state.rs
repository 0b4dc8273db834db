//! Application state shared across handlers.

use paylink_billing::{WebhookHandler, WebhookVerifier};
use paylink_core::{PaymentProvider, PriceTable};
use std::sync::Arc;

/// Application state shared across all handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn PaymentProvider>,
    pub prices: PriceTable,
    /// `None` rejects every webhook.
    pub webhook_verifier: Option<WebhookVerifier>,
    pub webhook_handler: Arc<dyn WebhookHandler>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        prices: PriceTable,
        webhook_verifier: Option<WebhookVerifier>,
        webhook_handler: Arc<dyn WebhookHandler>,
    ) -> Self {
        Self {
            provider,
            prices,
            webhook_verifier,
            webhook_handler,
        }
    }

    pub fn webhook_mode(&self) -> &'static str {
        match &self.webhook_verifier {
            Some(verifier) if verifier.is_verified() => "signed",
            Some(_) => "unverified",
            None => "disabled",
        }
    }
}
