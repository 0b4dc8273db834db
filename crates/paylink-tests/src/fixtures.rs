//! Webhook payload fixtures.

use paylink_billing::signature_header;
use serde_json::{Value, json};

/// Signing secret used by signed test contexts.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_paylink";

/// Factory for Stripe-shaped webhook events.
pub struct EventFixture;

impl EventFixture {
    /// An event of any type wrapping `object`.
    pub fn event(event_type: &str, object: Value) -> Value {
        json!({
            "id": "evt_test1",
            "object": "event",
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "livemode": false,
            "data": { "object": object }
        })
    }

    pub fn invoice_payment_succeeded(invoice_id: &str) -> Value {
        Self::event(
            "invoice.payment_succeeded",
            json!({
                "id": invoice_id,
                "object": "invoice",
                "customer": "cus_test1",
                "subscription": "sub_test1"
            }),
        )
    }

    pub fn invoice_payment_failed(invoice_id: &str) -> Value {
        Self::event(
            "invoice.payment_failed",
            json!({ "id": invoice_id, "object": "invoice", "customer": "cus_test1" }),
        )
    }

    pub fn subscription_updated(subscription_id: &str, status: &str) -> Value {
        Self::event(
            "customer.subscription.updated",
            json!({
                "id": subscription_id,
                "object": "subscription",
                "customer": "cus_test1",
                "status": status
            }),
        )
    }
}

/// Serialize an event and sign it as Stripe would, at the current time.
pub fn signed_payload(event: &Value, secret: &str) -> (Vec<u8>, String) {
    signed_payload_at(event, secret, chrono::Utc::now().timestamp())
}

/// Serialize an event and sign it at `timestamp`.
pub fn signed_payload_at(event: &Value, secret: &str, timestamp: i64) -> (Vec<u8>, String) {
    let payload = event.to_string().into_bytes();
    let header = signature_header(&payload, secret, timestamp);
    (payload, header)
}
