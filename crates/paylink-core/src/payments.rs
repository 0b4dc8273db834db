//! Provider-side payment entities.
//!
//! These are read-only views of objects owned by the payment provider. Paylink
//! never persists them; they live for the duration of a single request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Unpaid,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Trialing,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    /// Deleted customers are still returned by retrieval, flagged here.
    #[serde(default)]
    pub deleted: bool,
}

/// A single charge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
}

/// Invoice information, with its payment intent when expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub payment_intent: Option<PaymentIntent>,
}

/// Subscription information as observed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    pub latest_invoice: Option<Invoice>,
}

impl Subscription {
    /// Client secret of the first invoice's payment intent.
    ///
    /// Returns `None` when the invoice, its payment intent, or the secret
    /// itself is missing.
    pub fn client_secret(&self) -> Option<&str> {
        self.latest_invoice
            .as_ref()
            .and_then(|invoice| invoice.payment_intent.as_ref())
            .and_then(|intent| intent.client_secret.as_deref())
    }
}

/// Parameters for creating a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomer {
    pub email: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

/// Parameters for creating a subscription awaiting its first payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub customer_id: String,
    pub price_id: String,
    pub metadata: HashMap<String, String>,
}

/// Parameters for creating a one-off payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentIntent {
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub automatic_payment_methods: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(latest_invoice: Option<Invoice>) -> Subscription {
        Subscription {
            id: "sub_123".into(),
            customer_id: "cus_123".into(),
            status: SubscriptionStatus::Incomplete,
            latest_invoice,
        }
    }

    #[test]
    fn test_client_secret_from_expanded_invoice() {
        let sub = subscription(Some(Invoice {
            id: "in_123".into(),
            payment_intent: Some(PaymentIntent {
                id: "pi_123".into(),
                amount: 1990,
                currency: "brl".into(),
                client_secret: Some("pi_123_secret_abc".into()),
            }),
        }));
        assert_eq!(sub.client_secret(), Some("pi_123_secret_abc"));
    }

    #[test]
    fn test_client_secret_tolerates_missing_links() {
        assert_eq!(subscription(None).client_secret(), None);

        let sub = subscription(Some(Invoice {
            id: "in_123".into(),
            payment_intent: None,
        }));
        assert_eq!(sub.client_secret(), None);
    }

    #[test]
    fn test_subscription_status_serde() {
        let status = SubscriptionStatus::IncompleteExpired;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"incomplete_expired\"");
        assert_eq!(status.to_string(), "incomplete_expired");
    }
}
