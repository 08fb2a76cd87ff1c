//! Order integration tests.
//!
//! Every order operation is limited to the customer named on the order.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use store_service::models::Fields;
use store_service::repositories::MemoryStore;
use store_test_utils::{TestStoreServer, TestTokenBuilder};
use uuid::Uuid;

const ALICE: &str = "alice@example.com";
const BOB: &str = "bob@example.com";

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

/// Server with two orders for Alice and one for Bob.
async fn spawn_with_orders() -> Result<(TestStoreServer, Uuid, Uuid)> {
    let store = Arc::new(MemoryStore::new());
    let alice_order = store
        .seed_order(ALICE, 499.0, fields(json!({"item": "Stratocaster"})))
        .await;
    store
        .seed_order(ALICE, 35.5, fields(json!({"item": "Strings"})))
        .await;
    let bob_order = store
        .seed_order(BOB, 1200.0, fields(json!({"item": "Upright piano"})))
        .await;
    Ok((TestStoreServer::spawn(store).await?, alice_order, bob_order))
}

fn token_for(email: &str) -> String {
    TestTokenBuilder::new().for_email(email).sign()
}

#[tokio::test]
async fn test_create_order_for_own_email() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/order", server.url()))
        .bearer_auth(token_for(ALICE))
        .json(&json!({"customerEmail": ALICE, "price": 120.5, "item": "Cajon", "_id": "forged"}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["acknowledged"], true);

    let inserted_id: Uuid = body["result"]["insertedId"].as_str().unwrap().parse()?;
    let orders = server.store().orders().await;
    assert_eq!(orders.len(), 1);
    let order = orders.first().unwrap();
    assert_eq!(order.id, inserted_id);
    assert_eq!(order.customer_email, ALICE);
    assert_eq!(order.price, 120.5);
    assert_eq!(order.fields["item"], "Cajon");
    assert!(!order.fields.contains_key("_id"));

    Ok(())
}

#[tokio::test]
async fn test_create_order_for_other_email_returns_403() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/order", server.url()))
        .bearer_auth(token_for(ALICE))
        .json(&json!({"customerEmail": BOB, "price": 10}))
        .send()
        .await?;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "forbidden access");
    assert!(server.store().orders().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_create_order_validation() -> Result<()> {
    let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/order", server.url()))
        .json(&json!({"customerEmail": ALICE, "price": 10}))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    for bad in [
        json!({"customerEmail": ALICE, "price": -1}),
        json!({"customerEmail": ALICE}),
        json!({"price": 10}),
    ] {
        let response = client
            .post(format!("{}/order", server.url()))
            .bearer_auth(token_for(ALICE))
            .json(&bad)
            .send()
            .await?;
        assert_eq!(response.status(), 400, "body {bad}");
    }

    assert!(server.store().orders().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_orders_returns_exactly_callers_orders() -> Result<()> {
    let (server, _, _) = spawn_with_orders().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/order", server.url()))
        .query(&[("customerEmail", ALICE)])
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let orders: Value = response.json().await?;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["customerEmail"] == ALICE));

    Ok(())
}

#[tokio::test]
async fn test_list_orders_for_other_email_returns_403() -> Result<()> {
    let (server, _, _) = spawn_with_orders().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/order", server.url()))
        .query(&[("customerEmail", BOB)])
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "forbidden access");

    // Without the query parameter there is nothing to own
    let response = client
        .get(format!("{}/order", server.url()))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 403);

    // Email matching is exact
    let response = client
        .get(format!("{}/order", server.url()))
        .query(&[("customerEmail", "Alice@Example.com")])
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 403);

    Ok(())
}

#[tokio::test]
async fn test_get_order_by_id() -> Result<()> {
    let (server, alice_order, bob_order) = spawn_with_orders().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/order/{}", server.url(), alice_order))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let order: Value = response.json().await?;
    assert_eq!(order["_id"], alice_order.to_string());
    assert_eq!(order["item"], "Stratocaster");
    assert_eq!(order["price"], 499.0);

    let response = client
        .get(format!("{}/order/{}", server.url(), bob_order))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 403);

    Ok(())
}

#[tokio::test]
async fn test_get_order_bad_and_unknown_ids() -> Result<()> {
    let (server, _, _) = spawn_with_orders().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/order/not-an-id", server.url()))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Invalid id");

    let response = client
        .get(format!("{}/order/{}", server.url(), Uuid::new_v4()))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Order not found");

    Ok(())
}

#[tokio::test]
async fn test_delete_own_orders() -> Result<()> {
    let (server, _, _) = spawn_with_orders().await?;

    let response = reqwest::Client::new()
        .delete(format!("{}/order/{}", server.url(), ALICE))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["acknowledged"], true);
    assert_eq!(body["deletedCount"], 2);

    let remaining = server.store().orders().await;
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|o| o.customer_email == BOB));

    Ok(())
}

#[tokio::test]
async fn test_delete_other_customers_orders_returns_403() -> Result<()> {
    let (server, _, _) = spawn_with_orders().await?;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/order/{}", server.url(), BOB))
        .bearer_auth(token_for(ALICE))
        .send()
        .await?;
    assert_eq!(response.status(), 403);

    let response = client
        .delete(format!("{}/order/{}", server.url(), BOB))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    assert_eq!(server.store().orders().await.len(), 3);

    Ok(())
}
