//! Payment provider client.
//!
//! Creates payment intents with a Stripe-compatible API so the storefront can
//! complete a card payment client-side with the returned client secret.
//!
//! # Security
//!
//! - The provider secret key is held as a `SecretString` and only exposed
//!   when building the `Authorization` header
//! - Client secrets are never logged
//! - Provider errors are logged server-side; callers get a generic 502

use crate::errors::StoreError;
use crate::observability::metrics::record_payment_intent;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Timeout for payment provider requests in seconds.
const PAYMENT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Largest amount accepted, in minor units (provider limit).
pub const MAX_AMOUNT_MINOR: i64 = 99_999_999;

/// A created payment intent.
#[derive(Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("id", &self.id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Convert a price in major units to minor units.
///
/// # Errors
///
/// `StoreError::BadRequest` for non-finite, non-positive, or too large prices.
pub fn price_to_minor_units(price: f64) -> Result<i64, StoreError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(StoreError::BadRequest(
            "price must be a positive number".to_string(),
        ));
    }

    let amount = (price * 100.0).round();
    // Bounds are checked on the float so the cast below cannot saturate
    #[allow(clippy::cast_precision_loss)]
    let max_amount = MAX_AMOUNT_MINOR as f64;
    if !(1.0..=max_amount).contains(&amount) {
        return Err(StoreError::BadRequest(format!(
            "price must convert to between 1 and {MAX_AMOUNT_MINOR} minor units"
        )));
    }

    #[allow(clippy::cast_possible_truncation)]
    let amount_minor = amount as i64;
    Ok(amount_minor)
}

/// Trait for payment providers, allowing mocking in tests.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a card payment intent for `amount_minor` in `currency`.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, StoreError>;
}

/// HTTP client for the Stripe payment intents API.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` if the HTTP client cannot be built.
    pub fn new(base_url: String, secret_key: SecretString) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PAYMENT_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                error!(target: "store.services.payments", error = %e, "Failed to build HTTP client");
                StoreError::Internal
            })?;

        Ok(Self {
            client,
            base_url,
            secret_key,
        })
    }

    async fn send(&self, amount_minor: i64, currency: &str) -> Result<PaymentIntent, StoreError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let form = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "store.services.payments", error = %e, "Payment provider request failed");
                StoreError::PaymentProvider("request failed".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 401 {
                error!(target: "store.services.payments", "Payment provider rejected the secret key");
            } else {
                warn!(target: "store.services.payments", status = %status, "Payment provider returned error");
            }
            return Err(StoreError::PaymentProvider(format!("status {status}")));
        }

        response.json::<PaymentIntent>().await.map_err(|e| {
            error!(target: "store.services.payments", error = %e, "Failed to parse payment provider response");
            StoreError::PaymentProvider("unparseable response".to_string())
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip_all, name = "store.services.payments.create_intent", fields(amount_minor = amount_minor, currency = %currency))]
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, StoreError> {
        let start = Instant::now();
        let result = self.send(amount_minor, currency).await;
        let status = if result.is_ok() { "success" } else { "error" };
        record_payment_intent(status, start.elapsed());
        result
    }
}

/// Mock payment provider for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    /// Mock provider that either always succeeds or always fails.
    pub struct MockPaymentProvider {
        call_count: AtomicUsize,
        last_amount: AtomicI64,
        return_error: bool,
    }

    impl MockPaymentProvider {
        /// Create a mock that always returns an intent.
        pub fn succeeding() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                last_amount: AtomicI64::new(0),
                return_error: false,
            }
        }

        /// Create a mock that always fails.
        pub fn failing() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                last_amount: AtomicI64::new(0),
                return_error: true,
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Amount of the most recent call, in minor units.
        pub fn last_amount(&self) -> i64 {
            self.last_amount.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_payment_intent(
            &self,
            amount_minor: i64,
            _currency: &str,
        ) -> Result<PaymentIntent, StoreError> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
            self.last_amount.store(amount_minor, Ordering::SeqCst);

            if self.return_error {
                return Err(StoreError::PaymentProvider(
                    "Mock payment provider error".to_string(),
                ));
            }

            Ok(PaymentIntent {
                id: format!("pi_mock_{count}"),
                client_secret: format!("pi_mock_{count}_secret_test"),
            })
        }
    }
}
