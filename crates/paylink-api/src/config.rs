//! Server configuration.
//!
//! Settings come from the process environment (after `.env` is loaded by the
//! binary). Variable names are the upper-case field names, e.g. `PORT` or
//! `MONTHLY_PRICE_ID`.

use paylink_billing::WebhookVerifier;
use paylink_billing::webhooks::DEFAULT_TOLERANCE_SECS;
use paylink_core::{Error, PriceTable, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Stripe secret API key.
    pub payment_provider_secret_key: String,
    /// Price for the monthly plan.
    #[serde(default)]
    pub monthly_price_id: Option<String>,
    /// Price for the annual plan.
    #[serde(default)]
    pub annual_price_id: Option<String>,
    /// Webhook endpoint signing secret.
    #[serde(default)]
    pub webhook_signing_secret: Option<String>,
    /// Accept unsigned webhooks when no signing secret is set. Insecure.
    #[serde(default)]
    pub webhook_allow_unverified: bool,
    #[serde(default = "default_tolerance")]
    pub webhook_tolerance_secs: i64,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4242
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::default())
    }

    /// Load settings from an explicit variable map instead of the environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(source: config::Environment) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        if settings.payment_provider_secret_key.trim().is_empty() {
            return Err(Error::Config(
                "PAYMENT_PROVIDER_SECRET_KEY must not be empty".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn price_table(&self) -> PriceTable {
        PriceTable::new(self.monthly_price_id.clone(), self.annual_price_id.clone())
    }

    /// How webhooks are authenticated; `None` means they are all rejected.
    pub fn webhook_verifier(&self) -> Option<WebhookVerifier> {
        match self.webhook_signing_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                Some(WebhookVerifier::signed(secret).with_tolerance(self.webhook_tolerance_secs))
            }
            _ if self.webhook_allow_unverified => Some(WebhookVerifier::Unverified),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::from_vars(vars(&[("PAYMENT_PROVIDER_SECRET_KEY", "sk_test_xxx")])).unwrap();
        assert_eq!(settings.port, 4242);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.webhook_tolerance_secs, 300);
        assert!(!settings.price_table().is_configured());
        assert!(settings.webhook_verifier().is_none());
    }

    #[test]
    fn test_secret_key_is_required() {
        let err = Settings::from_vars(vars(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Settings::from_vars(vars(&[("PAYMENT_PROVIDER_SECRET_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_full_configuration() {
        let settings = Settings::from_vars(vars(&[
            ("PAYMENT_PROVIDER_SECRET_KEY", "sk_test_xxx"),
            ("MONTHLY_PRICE_ID", "price_monthly"),
            ("ANNUAL_PRICE_ID", "price_annual"),
            ("WEBHOOK_SIGNING_SECRET", "whsec_xxx"),
            ("WEBHOOK_TOLERANCE_SECS", "60"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.price_table().is_configured());
        assert!(matches!(
            settings.webhook_verifier(),
            Some(WebhookVerifier::Signed {
                tolerance_secs: 60,
                ..
            })
        ));
    }

    #[test]
    fn test_unverified_webhooks_need_explicit_flag() {
        let settings = Settings::from_vars(vars(&[
            ("PAYMENT_PROVIDER_SECRET_KEY", "sk_test_xxx"),
            ("WEBHOOK_ALLOW_UNVERIFIED", "true"),
        ]))
        .unwrap();
        assert!(matches!(
            settings.webhook_verifier(),
            Some(WebhookVerifier::Unverified)
        ));

        let settings = Settings::from_vars(vars(&[
            ("PAYMENT_PROVIDER_SECRET_KEY", "sk_test_xxx"),
            ("WEBHOOK_SIGNING_SECRET", ""),
        ]))
        .unwrap();
        assert!(settings.webhook_verifier().is_none());
    }
}
