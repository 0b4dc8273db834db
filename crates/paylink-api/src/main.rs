//! Paylink server entrypoint.

use paylink_api::{AppState, Settings, build_app, telemetry};
use paylink_billing::{LoggingWebhookHandler, StripeClient, StripeConfig, WebhookVerifier};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    telemetry::init_tracing(settings.log_format);

    let provider = StripeClient::new(StripeConfig::new(
        settings.payment_provider_secret_key.clone(),
    ));

    let webhook_verifier = settings.webhook_verifier();
    match &webhook_verifier {
        Some(WebhookVerifier::Signed { .. }) => {}
        Some(WebhookVerifier::Unverified) => {
            warn!("Webhook signature verification is disabled; do not run this in production")
        }
        None => warn!(
            "WEBHOOK_SIGNING_SECRET is not set; all webhooks will be rejected \
             (set WEBHOOK_ALLOW_UNVERIFIED=true to accept unsigned events)"
        ),
    }

    let prices = settings.price_table();
    info!(
        subscriptions_enabled = prices.is_configured(),
        "Loaded payment configuration"
    );

    let state = Arc::new(AppState::new(
        Arc::new(provider),
        prices,
        webhook_verifier,
        Arc::new(LoggingWebhookHandler),
    ));

    let listener = TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
