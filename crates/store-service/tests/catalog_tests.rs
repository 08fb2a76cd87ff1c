//! Catalog and review integration tests.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use store_service::models::Fields;
use store_service::repositories::MemoryStore;
use store_test_utils::{TestStoreServer, TestTokenBuilder};
use uuid::Uuid;

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_list_and_get_instruments() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let guitar = store
        .seed_instrument(fields(json!({"name": "Telecaster", "price": 899})))
        .await;
    store
        .seed_instrument(fields(json!({"name": "Cello", "price": 2400})))
        .await;
    let server = TestStoreServer::spawn(store).await?;

    let instruments: Value = reqwest::get(format!("{}/instruments", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(instruments.as_array().unwrap().len(), 2);

    let response = reqwest::get(format!("{}/instruments/{}", server.url(), guitar)).await?;
    assert_eq!(response.status(), 200);
    let instrument: Value = response.json().await?;
    assert_eq!(
        instrument,
        json!({"_id": guitar.to_string(), "name": "Telecaster", "price": 899})
    );

    Ok(())
}

#[tokio::test]
async fn test_unknown_instrument_returns_404() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;

    let response =
        reqwest::get(format!("{}/instruments/{}", server.url(), Uuid::new_v4())).await?;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Instrument not found");

    Ok(())
}

#[tokio::test]
async fn test_malformed_instrument_id_returns_400() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;

    let response = reqwest::get(format!("{}/instruments/abc123", server.url())).await?;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Invalid id");

    // The server keeps serving afterwards
    let response = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_post_review_requires_credential() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/reviews", server.url()))
        .json(&json!({"rating": 5}))
        .send()
        .await?;

    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_post_then_list_reviews() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;
    let token = TestTokenBuilder::new().for_email("judy@example.com").sign();

    let response = reqwest::Client::new()
        .post(format!("{}/reviews", server.url()))
        .bearer_auth(token)
        .json(&json!({"_id": "chosen-id", "rating": 5, "text": "Great shop"}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let result: Value = response.json().await?;
    assert_eq!(result["acknowledged"], true);
    let inserted_id = result["insertedId"].as_str().unwrap().to_string();
    assert_ne!(inserted_id, "chosen-id");

    let reviews: Value = reqwest::get(format!("{}/reviews", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(
        reviews,
        json!([{"_id": inserted_id, "rating": 5, "text": "Great shop"}])
    );

    Ok(())
}
