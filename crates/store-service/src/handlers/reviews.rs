//! Review handlers.

use super::parse_object;
use crate::errors::StoreError;
use crate::models::{strip_reserved, InsertResult, Review, DOCUMENT_RESERVED_KEYS};
use crate::routes::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /reviews (public)
#[instrument(skip_all, name = "store.handlers.list_reviews")]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Review>>, StoreError> {
    let reviews = state.store.list_reviews().await?;
    Ok(Json(reviews))
}

/// Handler for POST /reviews (authenticated)
///
/// Stores the body as-is apart from reserved keys. Reviews are not linked
/// to the caller.
#[instrument(skip_all, name = "store.handlers.create_review")]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertResult>, StoreError> {
    let mut fields = parse_object(&body)?;
    strip_reserved(&mut fields, DOCUMENT_RESERVED_KEYS);

    let result = state.store.insert_review(fields).await?;
    Ok(Json(result))
}
