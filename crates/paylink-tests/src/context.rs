//! Test context running a server over in-memory collaborators.

use crate::fixtures::TEST_WEBHOOK_SECRET;
use crate::helpers::{ApiTestClient, start_test_server};
use crate::mocks::{MockProvider, RecordingWebhookHandler};
use paylink_api::AppState;
use paylink_billing::WebhookVerifier;
use paylink_core::PriceTable;
use std::sync::Arc;

/// What the server under test is configured with.
pub struct TestConfig {
    pub provider: MockProvider,
    pub prices: PriceTable,
    pub webhook_verifier: Option<WebhookVerifier>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            provider: MockProvider::new(),
            prices: PriceTable::default(),
            webhook_verifier: Some(WebhookVerifier::signed(TEST_WEBHOOK_SECRET)),
        }
    }
}

impl TestConfig {
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_prices(mut self, monthly: Option<&str>, annual: Option<&str>) -> Self {
        self.prices = PriceTable::new(monthly.map(String::from), annual.map(String::from));
        self
    }

    pub fn with_webhook_verifier(mut self, verifier: Option<WebhookVerifier>) -> Self {
        self.webhook_verifier = verifier;
        self
    }
}

/// Running server plus handles on its collaborators.
///
/// Dropping the context stops the server.
pub struct TestContext {
    pub client: ApiTestClient,
    pub provider: Arc<MockProvider>,
    pub handler: Arc<RecordingWebhookHandler>,
    server: tokio::task::JoinHandle<()>,
}

impl TestContext {
    /// Start a server configured by `config`.
    pub async fn start(config: TestConfig) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let provider = Arc::new(config.provider);
        let handler = Arc::new(RecordingWebhookHandler::default());
        let state = Arc::new(AppState::new(
            provider.clone(),
            config.prices,
            config.webhook_verifier,
            handler.clone(),
        ));

        let (addr, server) = start_test_server(state).await?;

        Ok(Self {
            client: ApiTestClient::new(addr),
            provider,
            handler,
            server,
        })
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}
