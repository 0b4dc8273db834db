//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the core domain and external adapters.

use crate::Result;
use crate::payments::{
    Customer, NewCustomer, NewPaymentIntent, NewSubscription, PaymentIntent, Subscription,
};
use async_trait::async_trait;

/// Payment provider capabilities used by the checkout flow.
///
/// Every method maps to exactly one provider API call. Failures of any kind
/// are reported as [`crate::Error::Provider`] carrying the provider's message.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Retrieve a customer by ID. Deleted customers are returned with
    /// `deleted` set rather than as an error.
    async fn retrieve_customer(&self, id: &str) -> Result<Customer>;

    /// Create a customer.
    async fn create_customer(&self, params: &NewCustomer) -> Result<Customer>;

    /// Create a subscription in incomplete state with the latest invoice's
    /// payment intent expanded.
    async fn create_subscription(&self, params: &NewSubscription) -> Result<Subscription>;

    /// Create a standalone payment intent.
    async fn create_payment_intent(&self, params: &NewPaymentIntent) -> Result<PaymentIntent>;
}
