//! Stripe client wrapper.

use async_trait::async_trait;
use paylink_core::{
    Customer, Error, Invoice, NewCustomer, NewPaymentIntent, NewSubscription, PaymentIntent,
    PaymentProvider, Result, Subscription, SubscriptionStatus,
};
use stripe::{
    Client, CreateCustomer, CreatePaymentIntent, CreatePaymentIntentAutomaticPaymentMethods,
    CreateSubscription, CreateSubscriptionItems, Currency, CustomerId, Expandable,
    SubscriptionPaymentBehavior,
};
use tracing::{debug, info, warn};

/// Expansion that makes the first invoice's client secret reachable in the
/// subscription creation response.
const SUBSCRIPTION_EXPAND: &[&str] = &["latest_invoice.payment_intent"];

/// Stripe client configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_key: String,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

/// Stripe-backed [`PaymentProvider`].
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(config.api_key),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn retrieve_customer(&self, id: &str) -> Result<Customer> {
        let customer_id = parse_customer_id(id)?;
        let customer = stripe::Customer::retrieve(&self.client, &customer_id, &[])
            .await
            .map_err(provider_error)?;

        debug!(customer_id = %customer.id, deleted = customer.deleted, "Retrieved Stripe customer");
        Ok(to_customer(customer))
    }

    async fn create_customer(&self, params: &NewCustomer) -> Result<Customer> {
        let mut create = CreateCustomer::new();
        create.email = params.email.as_deref();
        create.metadata = params.metadata.clone();

        let customer = stripe::Customer::create(&self.client, create)
            .await
            .map_err(provider_error)?;

        info!(customer_id = %customer.id, "Created Stripe customer");
        Ok(to_customer(customer))
    }

    async fn create_subscription(&self, params: &NewSubscription) -> Result<Subscription> {
        let customer_id = parse_customer_id(&params.customer_id)?;

        let mut create = CreateSubscription::new(customer_id);
        create.items = Some(vec![CreateSubscriptionItems {
            price: Some(params.price_id.clone()),
            ..Default::default()
        }]);
        create.payment_behavior = Some(SubscriptionPaymentBehavior::DefaultIncomplete);
        create.metadata = Some(params.metadata.clone());
        create.expand = SUBSCRIPTION_EXPAND;

        let subscription = stripe::Subscription::create(&self.client, create)
            .await
            .map_err(provider_error)?;

        info!(
            subscription_id = %subscription.id,
            customer_id = %params.customer_id,
            price_id = %params.price_id,
            "Created Stripe subscription"
        );
        Ok(to_subscription(subscription))
    }

    async fn create_payment_intent(&self, params: &NewPaymentIntent) -> Result<PaymentIntent> {
        let currency = parse_currency(&params.currency)?;

        let mut create = CreatePaymentIntent::new(params.amount, currency);
        if params.automatic_payment_methods {
            create.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
                allow_redirects: None,
                enabled: true,
            });
        }

        let intent = stripe::PaymentIntent::create(&self.client, create)
            .await
            .map_err(provider_error)?;

        info!(
            payment_intent_id = %intent.id,
            amount = params.amount,
            currency = %params.currency,
            "Created Stripe payment intent"
        );
        Ok(to_payment_intent(&intent))
    }
}

fn parse_customer_id(id: &str) -> Result<CustomerId> {
    id.parse()
        .map_err(|_| Error::Provider(format!("No such customer: '{}'", id)))
}

/// Stripe currency codes are the lowercase ISO codes.
fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_ascii_lowercase()))
        .map_err(|_| Error::InvalidCurrency(code.to_string()))
}

/// Surface Stripe's own message when it sent one.
fn provider_error(err: stripe::StripeError) -> Error {
    match err {
        stripe::StripeError::Stripe(request) => {
            let message = request
                .message
                .clone()
                .unwrap_or_else(|| request.to_string());
            Error::Provider(message)
        }
        other => Error::Provider(other.to_string()),
    }
}

fn to_customer(customer: stripe::Customer) -> Customer {
    Customer {
        id: customer.id.to_string(),
        email: customer.email,
        deleted: customer.deleted,
    }
}

fn to_payment_intent(intent: &stripe::PaymentIntent) -> PaymentIntent {
    PaymentIntent {
        id: intent.id.to_string(),
        amount: intent.amount,
        currency: intent.currency.to_string(),
        client_secret: intent.client_secret.clone(),
    }
}

fn to_invoice(invoice: &stripe::Invoice) -> Invoice {
    Invoice {
        id: invoice.id.to_string(),
        payment_intent: invoice
            .payment_intent
            .as_ref()
            .and_then(Expandable::as_object)
            .map(to_payment_intent),
    }
}

fn to_subscription(subscription: stripe::Subscription) -> Subscription {
    Subscription {
        id: subscription.id.to_string(),
        customer_id: subscription.customer.id().to_string(),
        status: to_status(subscription.status.as_str()),
        latest_invoice: subscription
            .latest_invoice
            .as_ref()
            .and_then(Expandable::as_object)
            .map(to_invoice),
    }
}

fn to_status(status: &str) -> SubscriptionStatus {
    match status {
        "active" => SubscriptionStatus::Active,
        "past_due" => SubscriptionStatus::PastDue,
        "unpaid" => SubscriptionStatus::Unpaid,
        "canceled" => SubscriptionStatus::Canceled,
        "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
        "trialing" => SubscriptionStatus::Trialing,
        "paused" => SubscriptionStatus::Paused,
        "incomplete" => SubscriptionStatus::Incomplete,
        other => {
            warn!(status = other, "Unknown Stripe subscription status, treating as incomplete");
            SubscriptionStatus::Incomplete
        }
    }
}
