//! HTTP request handlers for the music store gateway.
//!
//! Request bodies are taken as raw bytes and parsed here so that malformed
//! JSON is reported as a `BadRequest` with the standard `{"message"}` body.

pub mod health;
pub mod instruments;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod users;

pub use health::{health_check, readiness_check, root};
pub use instruments::{get_instrument, list_instruments};
pub use metrics::metrics_handler;
pub use orders::{create_order, delete_orders, get_order, list_orders};
pub use payments::create_payment_intent;
pub use reviews::{create_review, list_reviews};
pub use users::{get_admin_status, list_users, promote_user, upsert_user};

use crate::errors::StoreError;
use crate::models::Fields;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Parse a JSON request body.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, StoreError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "store.handlers", error = %e, "Rejected request body");
        StoreError::BadRequest(format!("Invalid request body: {e}"))
    })
}

/// Parse a JSON request body that must be an object. An empty body is `{}`.
pub(crate) fn parse_object(body: &Bytes) -> Result<Fields, StoreError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    parse_json(body)
}

/// Parse a document id from a path segment.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::BadRequest("Invalid id".to_string()))
}
