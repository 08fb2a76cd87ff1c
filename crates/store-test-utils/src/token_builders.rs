//! Builder patterns for test access tokens
//!
//! Provides a fluent API for creating signed (and deliberately broken)
//! customer tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

/// Signing secret the test server is configured with.
pub const TEST_TOKEN_SECRET: &str = "test-access-token-secret-0123456789abcdef";

/// Builder for creating test customer tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_email("alice@example.com")
///     .expires_in(3600)
///     .sign();
/// ```
pub struct TestTokenBuilder {
    email: String,
    iat: i64,
    exp: i64,
}

impl TestTokenBuilder {
    /// Create a new token builder, valid for an hour from now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            email: "customer@example.com".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
        }
    }

    /// Set the customer email
    pub fn for_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Build the claims as a JSON value
    pub fn claims(&self) -> Value {
        json!({
            "email": self.email,
            "iat": self.iat,
            "exp": self.exp,
        })
    }

    /// Sign with [`TEST_TOKEN_SECRET`]
    pub fn sign(self) -> String {
        self.sign_with(TEST_TOKEN_SECRET)
    }

    /// Sign with an arbitrary HS256 secret
    pub fn sign_with(self, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &self.claims(),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HS256 signing with a static secret cannot fail")
    }

    /// Token with `alg: none` and an empty signature
    pub fn unsigned(self) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(self.claims().to_string());
        format!("{header}.{payload}.")
    }

    /// Validly signed token whose payload is then swapped for `email`
    pub fn tampered(self, email: &str) -> String {
        let mut forged = self.claims();
        forged["email"] = json!(email);
        let token = self.sign();
        let mut parts = token.split('.');
        let header = parts.next().unwrap_or_default();
        let _payload = parts.next();
        let signature = parts.next().unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(forged.to_string());
        format!("{header}.{payload}.{signature}")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
