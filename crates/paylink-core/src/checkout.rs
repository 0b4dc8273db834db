//! Checkout requests and flow selection.
//!
//! A creation request is resolved once into a [`CheckoutFlow`]: either a
//! recurring subscription (when the caller asked for a plan and the server has
//! plan prices configured) or a one-off payment intent.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::collections::HashMap;

/// Currency used when the request does not name one.
pub const DEFAULT_CURRENCY: &str = "brl";

/// One-off amount used when neither an amount nor a plan is given.
pub const DEFAULT_AMOUNT: i64 = 1990;

/// Billing plan requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Annual,
}

impl Plan {
    /// Interpret a requested plan name.
    ///
    /// Empty names mean no plan. `"annual"` is the annual plan and every other
    /// name falls back to monthly.
    pub fn from_requested(name: &str) -> Option<Self> {
        match name {
            "" => None,
            "annual" => Some(Plan::Annual),
            _ => Some(Plan::Monthly),
        }
    }

    /// One-off amount charged for this plan when no prices are configured.
    pub fn fallback_amount(&self) -> i64 {
        match self {
            Plan::Monthly => 1990,
            Plan::Annual => 17990,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::Monthly => f.write_str("monthly"),
            Plan::Annual => f.write_str("annual"),
        }
    }
}

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRequest {
    #[serde(default, deserialize_with = "loose_plan")]
    pub plan: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "loose_amount")]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CreationRequest {
    /// Parse a request body. An empty body is an empty request.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub fn plan(&self) -> Option<Plan> {
        self.plan.as_deref().and_then(Plan::from_requested)
    }

    /// Customer to reuse, if the caller supplied a non-empty ID.
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    /// Amount for a one-off payment: the explicit amount, else the plan's
    /// fallback, else [`DEFAULT_AMOUNT`]. A zero amount counts as missing.
    pub fn one_off_amount(&self) -> i64 {
        self.amount
            .filter(|amount| *amount != 0)
            .or_else(|| self.plan().map(|plan| plan.fallback_amount()))
            .unwrap_or(DEFAULT_AMOUNT)
    }
}

/// Browser clients do not always send a string plan. Falsy values (`null`,
/// `false`, `0`, `""`) mean no plan; any other value is taken as a plan name.
fn loose_plan<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(name) => Some(name),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    })
}

/// Amounts arrive as integers or numeric strings, both in minor units.
fn loose_amount<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid amount: {s:?}"))),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid amount: {n}"))),
        other => Err(de::Error::custom(format!("invalid amount: {other}"))),
    }
}

/// Price IDs configured for subscription plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceTable {
    monthly: Option<String>,
    annual: Option<String>,
}

impl PriceTable {
    /// Empty IDs are treated as unset.
    pub fn new(monthly: Option<String>, annual: Option<String>) -> Self {
        Self {
            monthly: monthly.filter(|id| !id.is_empty()),
            annual: annual.filter(|id| !id.is_empty()),
        }
    }

    /// Whether any plan price is configured, enabling subscriptions.
    pub fn is_configured(&self) -> bool {
        self.monthly.is_some() || self.annual.is_some()
    }

    pub fn price_for(&self, plan: Plan) -> Option<&str> {
        match plan {
            Plan::Monthly => self.monthly.as_deref(),
            Plan::Annual => self.annual.as_deref(),
        }
    }
}

/// The path a creation request takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutFlow {
    /// Recurring subscription billed at `price_id`.
    Subscription { plan: Plan, price_id: String },
    /// Single payment intent.
    OneOff { amount: i64, currency: String },
}

impl CheckoutFlow {
    /// Decide the flow for a request given the configured prices.
    ///
    /// Fails with [`Error::PlanNotConfigured`] when subscriptions are enabled
    /// but the requested plan has no price, even if the other plan does.
    pub fn resolve(request: &CreationRequest, prices: &PriceTable) -> Result<Self> {
        match request.plan() {
            Some(plan) if prices.is_configured() => {
                let price_id = prices.price_for(plan).ok_or(Error::PlanNotConfigured)?;
                Ok(CheckoutFlow::Subscription {
                    plan,
                    price_id: price_id.to_string(),
                })
            }
            _ => Ok(CheckoutFlow::OneOff {
                amount: request.one_off_amount(),
                currency: request.currency().to_string(),
            }),
        }
    }
}

/// Response of `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckoutResponse {
    #[serde(rename_all = "camelCase")]
    Subscription {
        client_secret: Option<String>,
        subscription_id: String,
        /// Returned so the client can reuse the customer on later requests.
        customer_id: String,
    },
    #[serde(rename_all = "camelCase")]
    OneOff { client_secret: Option<String> },
}

impl CheckoutResponse {
    pub fn client_secret(&self) -> Option<&str> {
        match self {
            CheckoutResponse::Subscription { client_secret, .. }
            | CheckoutResponse::OneOff { client_secret } => client_secret.as_deref(),
        }
    }
}
