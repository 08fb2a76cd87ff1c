//! Order handlers.
//!
//! Every order operation is restricted to the customer named on the order.
//! Listing and deletion are checked by the policy middleware from the query
//! or path; creation and fetch-by-id check the body or stored order here.

use super::{parse_id, parse_json};
use crate::errors::StoreError;
use crate::models::{CreateOrderResponse, DeleteResult, NewOrder, Order, OrderQuery};
use crate::policy::ensure_owner;
use crate::routes::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use common::jwt::CustomerClaims;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /order
#[instrument(skip_all, name = "store.handlers.create_order")]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<CustomerClaims>,
    body: Bytes,
) -> Result<Json<CreateOrderResponse>, StoreError> {
    let order: NewOrder = parse_json(&body)?;
    let order = order.validate().map_err(StoreError::BadRequest)?;

    ensure_owner(&claims, Some(&order.customer_email))?;

    let result = state.store.insert_order(order).await?;
    Ok(Json(CreateOrderResponse {
        success: true,
        result,
    }))
}

/// Handler for GET /order?customerEmail=
#[instrument(skip_all, name = "store.handlers.list_orders")]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, StoreError> {
    let orders = state
        .store
        .list_orders_by_email(&query.customer_email)
        .await?;
    Ok(Json(orders))
}

/// Handler for GET /order/:id
///
/// A malformed id is `BadRequest`, an unknown id `NotFound`, and another
/// customer's order `Forbidden`.
#[instrument(skip_all, name = "store.handlers.get_order")]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<String>,
) -> Result<Json<Order>, StoreError> {
    let id = parse_id(&id)?;

    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Order not found".to_string()))?;

    ensure_owner(&claims, Some(&order.customer_email))?;

    Ok(Json(order))
}

/// Handler for DELETE /order/:customerEmail
///
/// Shares the `/order/:id` route; the segment is a customer email here.
#[instrument(skip_all, name = "store.handlers.delete_orders")]
pub async fn delete_orders(
    State(state): State<Arc<AppState>>,
    Path(customer_email): Path<String>,
) -> Result<Json<DeleteResult>, StoreError> {
    let result = state.store.delete_orders_by_email(&customer_email).await?;
    Ok(Json(result))
}
