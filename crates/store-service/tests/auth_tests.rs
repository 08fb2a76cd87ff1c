//! Authentication and authorization integration tests.
//!
//! Drives the policy middleware through a real server: missing credentials,
//! bad tokens, and the admin capability.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use store_service::models::{Fields, Role};
use store_service::repositories::MemoryStore;
use store_test_utils::{TestStoreServer, TestTokenBuilder};

const ADMIN: &str = "admin@example.com";
const CUSTOMER: &str = "carol@example.com";

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

async fn spawn_with_users() -> Result<TestStoreServer> {
    let store = Arc::new(MemoryStore::new());
    store.seed_user(ADMIN, Role::Admin, Fields::new()).await;
    store
        .seed_user(CUSTOMER, Role::Customer, fields(json!({"name": "Carol"})))
        .await;
    TestStoreServer::spawn(store).await
}

async fn promote(
    server: &TestStoreServer,
    target: &str,
    token: Option<&str>,
) -> Result<reqwest::Response> {
    let mut request =
        reqwest::Client::new().put(format!("{}/user/admin/{}", server.url(), target));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    Ok(request.send().await?)
}

async fn is_admin(server: &TestStoreServer, email: &str) -> Result<bool> {
    let body: Value = reqwest::get(format!("{}/admin/{}", server.url(), email))
        .await?
        .json()
        .await?;
    Ok(body["admin"].as_bool().unwrap())
}

#[tokio::test]
async fn test_admin_route_without_credential_returns_401() -> Result<()> {
    let server = spawn_with_users().await?;

    let response = promote(&server, CUSTOMER, None).await?;

    assert_eq!(response.status(), 401);
    assert!(response.headers().get("www-authenticate").is_some());
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Unauthorized access");

    Ok(())
}

#[tokio::test]
async fn test_expired_token_returns_403() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new()
        .for_email(ADMIN)
        .issued_at(Utc::now().timestamp() - 7200)
        .expires_in(-3600)
        .sign();

    let response = promote(&server, CUSTOMER, Some(&token)).await?;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Forbidden access");
    assert!(!is_admin(&server, CUSTOMER).await?);

    Ok(())
}

#[tokio::test]
async fn test_token_signed_with_other_secret_returns_403() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new()
        .for_email(ADMIN)
        .sign_with("some-other-secret-that-is-long-enough!!");

    let response = promote(&server, CUSTOMER, Some(&token)).await?;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Forbidden access");

    Ok(())
}

#[tokio::test]
async fn test_tampered_and_unsigned_tokens_return_403() -> Result<()> {
    let server = spawn_with_users().await?;

    let tampered = TestTokenBuilder::new().for_email(CUSTOMER).tampered(ADMIN);
    let response = promote(&server, CUSTOMER, Some(&tampered)).await?;
    assert_eq!(response.status(), 403);

    let unsigned = TestTokenBuilder::new().for_email(ADMIN).unsigned();
    let response = promote(&server, CUSTOMER, Some(&unsigned)).await?;
    assert_eq!(response.status(), 403);

    assert!(!is_admin(&server, CUSTOMER).await?);

    Ok(())
}

#[tokio::test]
async fn test_non_bearer_scheme_returns_403() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new().for_email(ADMIN).sign();

    let response = reqwest::Client::new()
        .get(format!("{}/user", server.url()))
        .header("Authorization", format!("Basic {token}"))
        .send()
        .await?;

    assert_eq!(response.status(), 403);

    Ok(())
}

#[tokio::test]
async fn test_non_admin_cannot_promote() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new().for_email(CUSTOMER).sign();

    let response = promote(&server, CUSTOMER, Some(&token)).await?;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "forbidden");
    assert!(!is_admin(&server, CUSTOMER).await?);

    Ok(())
}

#[tokio::test]
async fn test_caller_without_user_record_is_not_admin() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new().for_email("ghost@example.com").sign();

    let response = promote(&server, CUSTOMER, Some(&token)).await?;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "forbidden");

    Ok(())
}

#[tokio::test]
async fn test_admin_promotes_user() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new().for_email(ADMIN).sign();

    assert!(!is_admin(&server, CUSTOMER).await?);

    let response = promote(&server, CUSTOMER, Some(&token)).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["acknowledged"], true);
    assert_eq!(body["matchedCount"], 1);
    assert_eq!(body["modifiedCount"], 1);
    assert!(is_admin(&server, CUSTOMER).await?);

    // The promoted user can now use admin routes themselves
    let promoted_token = TestTokenBuilder::new().for_email(CUSTOMER).sign();
    let response = promote(&server, ADMIN, Some(&promoted_token)).await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_promoting_unknown_email_matches_nothing() -> Result<()> {
    let server = spawn_with_users().await?;
    let token = TestTokenBuilder::new().for_email(ADMIN).sign();

    let response = promote(&server, "nobody@example.com", Some(&token)).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["matchedCount"], 0);
    assert_eq!(body["upsertedCount"], 0);
    assert!(!is_admin(&server, "nobody@example.com").await?);

    Ok(())
}

#[tokio::test]
async fn test_public_routes_need_no_credential() -> Result<()> {
    let server = spawn_with_users().await?;

    for path in ["/", "/health", "/instruments", "/reviews", "/admin/carol@example.com"] {
        let response = reqwest::get(format!("{}{}", server.url(), path)).await?;
        assert_eq!(response.status(), 200, "GET {path}");
    }

    Ok(())
}
