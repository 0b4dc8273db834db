//! Paylink Core
//!
//! Core domain types, traits, and error handling for Paylink.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the provider adapter and the HTTP server.

pub mod checkout;
pub mod error;
pub mod payments;
pub mod ports;

pub use checkout::{CheckoutFlow, CheckoutResponse, CreationRequest, Plan, PriceTable};
pub use error::{Error, Result};
pub use payments::{
    Customer, Invoice, NewCustomer, NewPaymentIntent, NewSubscription, PaymentIntent,
    Subscription, SubscriptionStatus,
};
pub use ports::PaymentProvider;
