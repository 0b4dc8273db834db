//! In-memory stand-ins for the payment provider and webhook handler.

use async_trait::async_trait;
use paylink_billing::{InvoiceEventData, SubscriptionEventData, WebhookError, WebhookHandler};
use paylink_core::{
    Customer, Error, Invoice, NewCustomer, NewPaymentIntent, NewSubscription, PaymentIntent,
    PaymentProvider, Result, Subscription, SubscriptionStatus,
};
use std::sync::Mutex;

/// Provider call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    RetrieveCustomer(String),
    CreateCustomer(NewCustomer),
    CreateSubscription(NewSubscription),
    CreatePaymentIntent(NewPaymentIntent),
}

/// Payment provider that keeps customers in memory and records every call.
#[derive(Default)]
pub struct MockProvider {
    customers: Mutex<Vec<Customer>>,
    calls: Mutex<Vec<ProviderCall>>,
    /// Message returned by every call when set.
    failure: Option<String>,
    /// Leave the latest invoice out of created subscriptions.
    omit_invoice: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a customer that retrieval will find.
    pub fn with_customer(self, id: impl Into<String>) -> Self {
        self.push_customer(id.into(), false);
        self
    }

    /// Add a customer that retrieval reports as deleted.
    pub fn with_deleted_customer(self, id: impl Into<String>) -> Self {
        self.push_customer(id.into(), true);
        self
    }

    /// Make every call fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Create subscriptions without an expanded latest invoice.
    pub fn without_invoice(mut self) -> Self {
        self.omit_invoice = true;
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_customers(&self) -> Vec<NewCustomer> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::CreateCustomer(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn created_subscriptions(&self) -> Vec<NewSubscription> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::CreateSubscription(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn created_payment_intents(&self) -> Vec<NewPaymentIntent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::CreatePaymentIntent(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    fn push_customer(&self, id: String, deleted: bool) {
        self.customers.lock().unwrap().push(Customer {
            id,
            email: None,
            deleted,
        });
    }

    fn record(&self, call: ProviderCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(Error::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn retrieve_customer(&self, id: &str) -> Result<Customer> {
        self.record(ProviderCall::RetrieveCustomer(id.to_string()))?;
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::Provider(format!("No such customer: '{}'", id)))
    }

    async fn create_customer(&self, params: &NewCustomer) -> Result<Customer> {
        self.record(ProviderCall::CreateCustomer(params.clone()))?;
        let mut customers = self.customers.lock().unwrap();
        let customer = Customer {
            id: format!("cus_test{}", customers.len() + 1),
            email: params.email.clone(),
            deleted: false,
        };
        customers.push(customer.clone());
        Ok(customer)
    }

    async fn create_subscription(&self, params: &NewSubscription) -> Result<Subscription> {
        self.record(ProviderCall::CreateSubscription(params.clone()))?;
        let latest_invoice = (!self.omit_invoice).then(|| Invoice {
            id: "in_test1".to_string(),
            payment_intent: Some(PaymentIntent {
                id: "pi_sub1".to_string(),
                amount: 1990,
                currency: "brl".to_string(),
                client_secret: Some("pi_sub1_secret_test".to_string()),
            }),
        });
        Ok(Subscription {
            id: "sub_test1".to_string(),
            customer_id: params.customer_id.clone(),
            status: SubscriptionStatus::Incomplete,
            latest_invoice,
        })
    }

    async fn create_payment_intent(&self, params: &NewPaymentIntent) -> Result<PaymentIntent> {
        self.record(ProviderCall::CreatePaymentIntent(params.clone()))?;
        Ok(PaymentIntent {
            id: "pi_test1".to_string(),
            amount: params.amount,
            currency: params.currency.clone(),
            client_secret: Some("pi_test1_secret_test".to_string()),
        })
    }
}

/// Webhook dispatch, as seen by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    InvoicePaymentSucceeded(InvoiceEventData),
    SubscriptionUpdated(SubscriptionEventData),
    InvoicePaymentFailed(InvoiceEventData),
    Unhandled(String),
}

/// Webhook handler that records every dispatch.
#[derive(Default)]
pub struct RecordingWebhookHandler {
    dispatched: Mutex<Vec<Dispatched>>,
}

impl RecordingWebhookHandler {
    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.dispatched.lock().unwrap().clone()
    }

    fn push(&self, dispatched: Dispatched) -> std::result::Result<(), WebhookError> {
        self.dispatched.lock().unwrap().push(dispatched);
        Ok(())
    }
}

#[async_trait]
impl WebhookHandler for RecordingWebhookHandler {
    async fn on_invoice_payment_succeeded(
        &self,
        data: InvoiceEventData,
    ) -> std::result::Result<(), WebhookError> {
        self.push(Dispatched::InvoicePaymentSucceeded(data))
    }

    async fn on_subscription_updated(
        &self,
        data: SubscriptionEventData,
    ) -> std::result::Result<(), WebhookError> {
        self.push(Dispatched::SubscriptionUpdated(data))
    }

    async fn on_invoice_payment_failed(
        &self,
        data: InvoiceEventData,
    ) -> std::result::Result<(), WebhookError> {
        self.push(Dispatched::InvoicePaymentFailed(data))
    }

    async fn on_unhandled(&self, event_type: &str) -> std::result::Result<(), WebhookError> {
        self.push(Dispatched::Unhandled(event_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_creates_sequential_customers() {
        let provider = MockProvider::new().with_customer("cus_existing");
        let customer = provider
            .create_customer(&NewCustomer::default())
            .await
            .unwrap();
        assert_eq!(customer.id, "cus_test2");
        assert!(provider.retrieve_customer("cus_test2").await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_provider_still_records() {
        let provider = MockProvider::new().failing("boom");
        let err = provider.retrieve_customer("cus_1").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(provider.calls().len(), 1);
    }
}
