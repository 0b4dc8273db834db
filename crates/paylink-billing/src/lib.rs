//! Stripe billing integration for Paylink.
//!
//! Provides the Stripe adapter for the payment provider port, the checkout
//! orchestrator that picks between subscriptions and one-off payments, and
//! webhook verification and dispatch.

pub mod checkout;
pub mod provider;
pub mod webhooks;

pub use checkout::create_checkout;
pub use provider::{StripeClient, StripeConfig};
pub use webhooks::{
    EventData, EventKind, InvoiceEventData, LoggingWebhookHandler, SIGNATURE_HEADER,
    SubscriptionEventData, WebhookError, WebhookEvent, WebhookHandler, WebhookVerifier,
    process_webhook, signature_header,
};
