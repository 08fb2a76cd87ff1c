//! Payment intent handler.

use super::parse_json;
use crate::errors::StoreError;
use crate::models::{PaymentIntentRequest, PaymentIntentResponse};
use crate::routes::AppState;
use crate::services::payments::price_to_minor_units;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /create-payment-intent (authenticated)
///
/// Body `{"price": <major units>}`; responds with the provider's client
/// secret.
#[instrument(skip_all, name = "store.handlers.create_payment_intent")]
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PaymentIntentResponse>, StoreError> {
    let request: PaymentIntentRequest = parse_json(&body)?;
    let amount_minor = price_to_minor_units(request.price)?;

    let intent = state
        .payments
        .create_payment_intent(amount_minor, &state.config.payment_currency)
        .await?;

    tracing::info!(
        target: "store.handlers.payments",
        intent_id = %intent.id,
        amount_minor,
        "Payment intent created"
    );

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
