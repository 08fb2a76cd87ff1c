//! User account handlers.
//!
//! `PUT /user/:email` is the sign-in path: every profile write re-issues an
//! access token for that email.

use super::parse_object;
use crate::crypto::issue_token;
use crate::errors::StoreError;
use crate::models::{
    strip_reserved, validate_email, AdminStatusResponse, UpdateResult, UpsertUserResponse, User,
    USER_RESERVED_KEYS,
};
use crate::routes::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use common::redact::hash_for_correlation;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /user (authenticated)
#[instrument(skip_all, name = "store.handlers.list_users")]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, StoreError> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

/// Handler for PUT /user/:email (public)
///
/// Creates or merges the profile for `email` and returns the write result
/// together with a freshly signed access token. `_id`, `email` and
/// `userType` in the body are ignored.
#[instrument(skip_all, name = "store.handlers.upsert_user")]
pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    body: Bytes,
) -> Result<Json<UpsertUserResponse>, StoreError> {
    validate_email(&email).map_err(|e| StoreError::BadRequest(e.to_string()))?;

    let mut profile = parse_object(&body)?;
    strip_reserved(&mut profile, USER_RESERVED_KEYS);

    let result = state.store.upsert_user(&email, profile).await?;

    let token = issue_token(
        &email,
        &state.config.access_token_secret,
        state.config.token_lifetime_seconds,
    )?;

    tracing::info!(
        target: "store.handlers.users",
        user = %hash_for_correlation(&email),
        created = result.upserted_count == 1,
        "Profile saved and token issued"
    );

    Ok(Json(UpsertUserResponse { result, token }))
}

/// Handler for GET /admin/:email (public)
///
/// Unknown users are reported as not admin.
#[instrument(skip_all, name = "store.handlers.get_admin_status")]
pub async fn get_admin_status(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatusResponse>, StoreError> {
    let role = state.store.get_role(&email).await?;
    Ok(Json(AdminStatusResponse {
        admin: role.is_some_and(|r| r.is_admin()),
    }))
}

/// Handler for PUT /user/admin/:email (admin only)
///
/// Promotes an existing user. An unknown email matches nothing and is
/// reported through the returned counts.
#[instrument(skip_all, name = "store.handlers.promote_user")]
pub async fn promote_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UpdateResult>, StoreError> {
    let result = state.store.promote_to_admin(&email).await?;

    tracing::info!(
        target: "store.handlers.users",
        user = %hash_for_correlation(&email),
        matched = result.matched_count,
        "Admin promotion requested"
    );

    Ok(Json(result))
}
