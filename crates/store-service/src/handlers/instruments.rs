//! Instrument catalog handlers. Public.

use super::parse_id;
use crate::errors::StoreError;
use crate::models::Instrument;
use crate::routes::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /instruments
#[instrument(skip_all, name = "store.handlers.list_instruments")]
pub async fn list_instruments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Instrument>>, StoreError> {
    let instruments = state.store.list_instruments().await?;
    Ok(Json(instruments))
}

/// Handler for GET /instruments/:id
///
/// A malformed id is `BadRequest`; an unknown id is `NotFound`.
#[instrument(skip_all, name = "store.handlers.get_instrument")]
pub async fn get_instrument(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Instrument>, StoreError> {
    let id = parse_id(&id)?;

    state
        .store
        .get_instrument(id)
        .await?
        .map(Json)
        .ok_or_else(|| StoreError::NotFound("Instrument not found".to_string()))
}
