//! Payment creation API tests.
//!
//! Run with: `cargo test -p paylink-tests --test api_tests`

use paylink_tests::{MockProvider, ProviderCall, TestConfig, TestContext};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn start(config: TestConfig) -> TestContext {
    TestContext::start(config)
        .await
        .expect("Failed to start test server")
}

async fn json_body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_health_endpoint() {
    let ctx = start(TestConfig::default().with_prices(Some("price_monthly"), None)).await;
    assert!(ctx.client.health().await.expect("Health check failed"));

    let body = json_body(ctx.client.get("/health").await.expect("Request failed")).await;
    assert_eq!(body["webhooks"], "signed");
    assert_eq!(body["subscriptions_enabled"], true);
}

#[tokio::test]
async fn test_monthly_plan_creates_customer_and_subscription() {
    let ctx = start(TestConfig::default().with_prices(Some("price_monthly"), None)).await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "plan": "monthly", "email": "ana@example.com" }))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["customerId"], "cus_test1");
    assert_eq!(body["subscriptionId"], "sub_test1");
    assert_eq!(body["clientSecret"], "pi_sub1_secret_test");

    let customers = ctx.provider.created_customers();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].email.as_deref(), Some("ana@example.com"));

    let subscriptions = ctx.provider.created_subscriptions();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].price_id, "price_monthly");
    assert_eq!(subscriptions[0].customer_id, "cus_test1");
}

#[tokio::test]
async fn test_annual_plan_without_annual_price_is_rejected() {
    let ctx = start(TestConfig::default().with_prices(Some("price_monthly"), None)).await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "plan": "annual" }))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "Requested plan not configured on server");
    assert!(ctx.provider.calls().is_empty());
}

#[tokio::test]
async fn test_existing_customer_is_reused() {
    let ctx = start(
        TestConfig::default()
            .with_prices(Some("price_monthly"), Some("price_annual"))
            .with_provider(MockProvider::new().with_customer("cus_existing")),
    )
    .await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "plan": "annual", "customerId": "cus_existing" }))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["customerId"], "cus_existing");
    assert!(ctx.provider.created_customers().is_empty());
    assert_eq!(ctx.provider.created_subscriptions()[0].price_id, "price_annual");
}

#[tokio::test]
async fn test_deleted_customer_is_replaced() {
    let ctx = start(
        TestConfig::default()
            .with_prices(Some("price_monthly"), None)
            .with_provider(MockProvider::new().with_deleted_customer("cus_deleted")),
    )
    .await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({
            "plan": "monthly",
            "customerId": "cus_deleted",
            "metadata": { "userId": "42" }
        }))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_ne!(body["customerId"], "cus_deleted");

    let calls = ctx.provider.calls();
    assert_eq!(calls[0], ProviderCall::RetrieveCustomer("cus_deleted".into()));
    assert!(matches!(calls[1], ProviderCall::CreateCustomer(_)));
    assert_eq!(
        ctx.provider.created_subscriptions()[0]
            .metadata
            .get("userId")
            .map(String::as_str),
        Some("42")
    );
}

#[tokio::test]
async fn test_missing_invoice_yields_null_secret() {
    let ctx = start(
        TestConfig::default()
            .with_prices(Some("price_monthly"), None)
            .with_provider(MockProvider::new().without_invoice()),
    )
    .await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "plan": "monthly" }))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["clientSecret"], Value::Null);
    assert_eq!(body["subscriptionId"], "sub_test1");
}

#[tokio::test]
async fn test_default_one_off_payment() {
    let ctx = start(TestConfig::default()).await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({}))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body, json!({ "clientSecret": "pi_test1_secret_test" }));

    let intents = ctx.provider.created_payment_intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, 1990);
    assert_eq!(intents[0].currency, "brl");
    assert!(intents[0].automatic_payment_methods);
}

#[tokio::test]
async fn test_empty_body_is_a_default_one_off_payment() {
    let ctx = start(TestConfig::default()).await;

    let resp = ctx
        .client
        .post_raw("/create-payment-intent", Vec::new())
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.provider.created_payment_intents()[0].amount, 1990);
}

#[tokio::test]
async fn test_annual_plan_without_prices_falls_back_to_one_off() {
    let ctx = start(TestConfig::default()).await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "plan": "annual" }))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let intents = ctx.provider.created_payment_intents();
    assert_eq!(intents[0].amount, 17990);
    assert!(ctx.provider.created_subscriptions().is_empty());
}

#[tokio::test]
async fn test_explicit_amount_and_currency() {
    let ctx = start(TestConfig::default()).await;

    ctx.client
        .create_payment_intent(&json!({ "amount": 4990, "currency": "usd" }))
        .await
        .expect("Request failed");

    let intents = ctx.provider.created_payment_intents();
    assert_eq!(intents[0].amount, 4990);
    assert_eq!(intents[0].currency, "usd");
}

#[tokio::test]
async fn test_provider_failure_is_a_server_error() {
    let ctx = start(
        TestConfig::default()
            .with_provider(MockProvider::new().failing("Invalid API Key provided")),
    )
    .await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({}))
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "Invalid API Key provided");
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let ctx = start(TestConfig::default()).await;

    let resp = ctx
        .client
        .post_raw("/create-payment-intent", "{\"plan\":")
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
    assert!(ctx.provider.calls().is_empty());
}

#[tokio::test]
async fn test_responses_carry_request_id_and_cors_headers() {
    let ctx = start(TestConfig::default()).await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({}))
        .await
        .expect("Request failed");
    assert!(resp.headers().contains_key("x-request-id"));

    let preflight = paylink_tests::test_client()
        .request(reqwest::Method::OPTIONS, ctx.client.url("/create-payment-intent"))
        .header("origin", "https://shop.example.com")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .expect("Request failed");
    assert_eq!(
        preflight
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_loosely_typed_plan_and_amount() {
    let ctx = start(TestConfig::default().with_prices(Some("price_monthly"), None)).await;

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "plan": true }))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        ctx.provider.created_subscriptions()[0].price_id,
        "price_monthly"
    );

    let resp = ctx
        .client
        .create_payment_intent(&json!({ "amount": "4990" }))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.provider.created_payment_intents()[0].amount, 4990);
}
