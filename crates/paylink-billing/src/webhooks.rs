//! Stripe webhook verification and handlers.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age of a signed payload.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

const EXPECTED_SCHEME: &str = "v1";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("No stripe-signature header value was provided.")]
    MissingSignature,
    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,
    #[error("No signatures found matching the expected signature for payload")]
    NoMatchingSignature,
    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,
    #[error("Webhook signing secret is not configured")]
    NotConfigured,
    #[error("{0}")]
    Parse(String),
    #[error("Handler error: {0}")]
    Handler(String),
}

/// How inbound payloads are authenticated.
#[derive(Debug, Clone)]
pub enum WebhookVerifier {
    /// Check the signature header against a shared signing secret.
    Signed { secret: String, tolerance_secs: i64 },
    /// Parse payloads without any authenticity check.
    Unverified,
}

impl WebhookVerifier {
    pub fn signed(secret: impl Into<String>) -> Self {
        WebhookVerifier::Signed {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Set the timestamp tolerance. Zero or less disables the age check.
    pub fn with_tolerance(self, secs: i64) -> Self {
        match self {
            WebhookVerifier::Signed { secret, .. } => WebhookVerifier::Signed {
                secret,
                tolerance_secs: secs,
            },
            unverified => unverified,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, WebhookVerifier::Signed { .. })
    }

    /// Authenticate and parse a raw webhook payload.
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, WebhookError> {
        self.construct_event_at(payload, signature, chrono::Utc::now().timestamp())
    }

    /// Same as [`Self::construct_event`] with an explicit current time.
    pub fn construct_event_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        if let WebhookVerifier::Signed {
            secret,
            tolerance_secs,
        } = self
        {
            let header = signature
                .filter(|s| !s.is_empty())
                .ok_or(WebhookError::MissingSignature)?;
            verify_signature(payload, header, secret, *tolerance_secs, now)?;
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::Parse(e.to_string()))
    }
}

/// Parsed `t=...,v1=...` signature header.
struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for item in header.split(',') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            EXPECTED_SCHEME => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(WebhookError::MalformedHeader),
    }
}

fn signer(payload: &[u8], secret: &str, timestamp: i64) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Verify a Stripe webhook signature header for `payload`.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), WebhookError> {
    let parsed = parse_header(header)?;
    let mac = signer(payload, secret, parsed.timestamp);

    let matched = parsed.signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(WebhookError::NoMatchingSignature);
    }

    if tolerance_secs > 0 && now - parsed.timestamp > tolerance_secs {
        return Err(WebhookError::TimestampOutsideTolerance);
    }

    Ok(())
}

/// Build a valid signature header for `payload` signed at `timestamp`.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = hex::encode(signer(payload, secret, timestamp).finalize().into_bytes());
    format!("t={},{}={}", timestamp, EXPECTED_SCHEME, signature)
}

/// Stripe webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    /// Empty when the payload carries no type; such events are unhandled.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: EventData,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub livemode: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }
}

/// Webhook event types we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    InvoicePaymentSucceeded,
    SubscriptionUpdated,
    InvoicePaymentFailed,
    Unhandled,
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "invoice.payment_succeeded" => EventKind::InvoicePaymentSucceeded,
            "customer.subscription.updated" => EventKind::SubscriptionUpdated,
            "invoice.payment_failed" => EventKind::InvoicePaymentFailed,
            _ => EventKind::Unhandled,
        }
    }
}

/// Invoice event data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceEventData {
    pub invoice_id: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// Subscription event data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEventData {
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<String>,
}

/// Webhook handler trait.
#[async_trait::async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn on_invoice_payment_succeeded(&self, data: InvoiceEventData)
    -> Result<(), WebhookError>;
    async fn on_subscription_updated(&self, data: SubscriptionEventData)
    -> Result<(), WebhookError>;
    async fn on_invoice_payment_failed(&self, data: InvoiceEventData) -> Result<(), WebhookError>;
    async fn on_unhandled(&self, event_type: &str) -> Result<(), WebhookError>;
}

/// Handler that only logs events. Persisting subscription state is left to
/// the deployment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingWebhookHandler;

#[async_trait::async_trait]
impl WebhookHandler for LoggingWebhookHandler {
    async fn on_invoice_payment_succeeded(
        &self,
        data: InvoiceEventData,
    ) -> Result<(), WebhookError> {
        info!(
            invoice_id = ?data.invoice_id,
            subscription_id = ?data.subscription_id,
            "Invoice payment succeeded"
        );
        Ok(())
    }

    async fn on_subscription_updated(
        &self,
        data: SubscriptionEventData,
    ) -> Result<(), WebhookError> {
        info!(
            subscription_id = ?data.subscription_id,
            status = ?data.status,
            "Subscription updated"
        );
        Ok(())
    }

    async fn on_invoice_payment_failed(&self, data: InvoiceEventData) -> Result<(), WebhookError> {
        info!(
            invoice_id = ?data.invoice_id,
            customer_id = ?data.customer_id,
            "Invoice payment failed"
        );
        Ok(())
    }

    async fn on_unhandled(&self, event_type: &str) -> Result<(), WebhookError> {
        info!(%event_type, "Unhandled event type");
        Ok(())
    }
}

/// Dispatch a verified event to the matching handler method.
pub async fn process_webhook<H>(handler: &H, event: &WebhookEvent) -> Result<(), WebhookError>
where
    H: WebhookHandler + ?Sized,
{
    info!(
        event_id = ?event.id,
        event_type = %event.event_type,
        livemode = event.livemode,
        "Processing Stripe webhook"
    );

    match event.kind() {
        EventKind::InvoicePaymentSucceeded => {
            let data = parse_invoice_data(&event.data)?;
            handler.on_invoice_payment_succeeded(data).await
        }
        EventKind::SubscriptionUpdated => {
            let data = parse_subscription_data(&event.data)?;
            handler.on_subscription_updated(data).await
        }
        EventKind::InvoicePaymentFailed => {
            let data = parse_invoice_data(&event.data)?;
            handler.on_invoice_payment_failed(data).await
        }
        EventKind::Unhandled => handler.on_unhandled(&event.event_type).await,
    }
}

fn event_object(data: &EventData) -> Result<&serde_json::Value, WebhookError> {
    if data.object.is_object() {
        Ok(&data.object)
    } else {
        warn!("Webhook event has no data object");
        Err(WebhookError::Parse("Missing object".into()))
    }
}

fn string_field(obj: &serde_json::Value, key: &str) -> Option<String> {
    obj[key].as_str().map(|s| s.to_string())
}

fn parse_invoice_data(data: &EventData) -> Result<InvoiceEventData, WebhookError> {
    let obj = event_object(data)?;

    Ok(InvoiceEventData {
        invoice_id: string_field(obj, "id"),
        customer_id: string_field(obj, "customer"),
        subscription_id: string_field(obj, "subscription"),
    })
}

fn parse_subscription_data(data: &EventData) -> Result<SubscriptionEventData, WebhookError> {
    let obj = event_object(data)?;

    Ok(SubscriptionEventData {
        subscription_id: string_field(obj, "id"),
        customer_id: string_field(obj, "customer"),
        status: string_field(obj, "status"),
    })
}
