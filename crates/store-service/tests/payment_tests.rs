//! Payment intent integration tests.
//!
//! The server runs against `MockPaymentProvider`; the HTTP client itself is
//! tested against wiremock in `services::payments`.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use store_service::repositories::MemoryStore;
use store_service::services::MockPaymentProvider;
use store_test_utils::{TestStoreServer, TestTokenBuilder};

async fn request_intent(server: &TestStoreServer, body: Value) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!("{}/create-payment-intent", server.url()))
        .bearer_auth(TestTokenBuilder::new().for_email("kim@example.com").sign())
        .json(&body)
        .send()
        .await?)
}

#[tokio::test]
async fn test_payment_intent_converts_to_minor_units() -> Result<()> {
    let payments = Arc::new(MockPaymentProvider::succeeding());
    let server =
        TestStoreServer::spawn_with(Arc::new(MemoryStore::new()), payments.clone()).await?;

    let response = request_intent(&server, json!({"price": 12.5})).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["clientSecret"], "pi_mock_1_secret_test");
    assert_eq!(payments.call_count(), 1);
    assert_eq!(payments.last_amount(), 1250);

    Ok(())
}

#[tokio::test]
async fn test_payment_intent_rejects_non_positive_prices() -> Result<()> {
    let payments = Arc::new(MockPaymentProvider::succeeding());
    let server =
        TestStoreServer::spawn_with(Arc::new(MemoryStore::new()), payments.clone()).await?;

    for price in [json!(0), json!(-5), json!(0.001)] {
        let response = request_intent(&server, json!({ "price": price })).await?;
        assert_eq!(response.status(), 400, "price {price}");
    }

    let response = request_intent(&server, json!({"price": "ten"})).await?;
    assert_eq!(response.status(), 400);

    assert_eq!(payments.call_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_payment_provider_failure_returns_502() -> Result<()> {
    let payments = Arc::new(MockPaymentProvider::failing());
    let server =
        TestStoreServer::spawn_with(Arc::new(MemoryStore::new()), payments.clone()).await?;

    let response = request_intent(&server, json!({"price": 20})).await?;

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Payment provider unavailable");
    assert_eq!(payments.call_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_payment_intent_requires_credential() -> Result<()> {
    let payments = Arc::new(MockPaymentProvider::succeeding());
    let server =
        TestStoreServer::spawn_with(Arc::new(MemoryStore::new()), payments.clone()).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/create-payment-intent", server.url()))
        .json(&json!({"price": 20}))
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    assert_eq!(payments.call_count(), 0);

    Ok(())
}
