//! Payment intent and subscription orchestration.

use paylink_core::{
    CheckoutFlow, CheckoutResponse, CreationRequest, Customer, NewCustomer, NewPaymentIntent,
    NewSubscription, PaymentProvider, PriceTable, Result,
};
use tracing::{info, warn};

/// Create a subscription or a one-off payment intent for a request.
///
/// Provider calls run in order: customer retrieval (when an ID was given),
/// customer creation (when retrieval did not yield a live customer), then the
/// subscription; or a single payment intent creation. Nothing is rolled back
/// when a later call fails.
pub async fn create_checkout<P>(
    provider: &P,
    prices: &PriceTable,
    request: &CreationRequest,
) -> Result<CheckoutResponse>
where
    P: PaymentProvider + ?Sized,
{
    match CheckoutFlow::resolve(request, prices)? {
        CheckoutFlow::Subscription { plan, price_id } => {
            let customer = resolve_customer(provider, request).await?;
            let subscription = provider
                .create_subscription(&NewSubscription {
                    customer_id: customer.id.clone(),
                    price_id,
                    metadata: request.metadata.clone().unwrap_or_default(),
                })
                .await?;

            info!(
                %plan,
                subscription_id = %subscription.id,
                customer_id = %customer.id,
                status = %subscription.status,
                "Subscription awaiting first payment"
            );

            Ok(CheckoutResponse::Subscription {
                client_secret: subscription.client_secret().map(String::from),
                subscription_id: subscription.id,
                customer_id: customer.id,
            })
        }
        CheckoutFlow::OneOff { amount, currency } => {
            let intent = provider
                .create_payment_intent(&NewPaymentIntent {
                    amount,
                    currency,
                    automatic_payment_methods: true,
                })
                .await?;

            Ok(CheckoutResponse::OneOff {
                client_secret: intent.client_secret,
            })
        }
    }
}

/// Reuse the requested customer when it exists, otherwise create one.
///
/// Any retrieval failure falls through to creation, including transient
/// provider errors.
async fn resolve_customer<P>(provider: &P, request: &CreationRequest) -> Result<Customer>
where
    P: PaymentProvider + ?Sized,
{
    if let Some(customer_id) = request.customer_id() {
        match provider.retrieve_customer(customer_id).await {
            Ok(customer) if !customer.deleted => return Ok(customer),
            Ok(_) => info!(%customer_id, "Customer was deleted, creating a new one"),
            Err(e) => warn!(
                %customer_id,
                error = %e,
                "Customer retrieval failed, creating a new one"
            ),
        }
    }

    provider
        .create_customer(&NewCustomer {
            email: request.email.clone(),
            metadata: request.metadata.clone(),
        })
        .await
}
