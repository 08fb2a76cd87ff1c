//! Policy middleware for protected routes.
//!
//! Extracts the bearer token from the `Authorization` header, verifies it,
//! evaluates the route's [`Capability`] and injects the verified
//! [`CustomerClaims`] into request extensions for handlers.

use crate::crypto::verify_token;
use crate::errors::StoreError;
use crate::policy::{authorize, Capability, EmailSource};
use crate::repositories::Store;
use axum::{
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use common::jwt::{extract_bearer_token, CustomerClaims};
use common::secret::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// State for one capability's policy middleware.
#[derive(Clone)]
pub struct PolicyState {
    pub store: Arc<dyn Store>,
    pub token_secret: SecretString,
    pub clock_skew_seconds: i64,
    pub capability: Capability,
}

/// Verify the request's bearer token.
///
/// - No `Authorization` header: `Unauthorized` (401)
/// - Anything other than a valid `Bearer <jwt>`: `InvalidToken` (403)
pub fn authenticate(
    headers: &HeaderMap,
    token_secret: &SecretString,
    clock_skew_seconds: i64,
) -> Result<CustomerClaims, StoreError> {
    let header = headers.get(AUTHORIZATION).ok_or_else(|| {
        tracing::debug!(target: "store.middleware.auth", "Missing Authorization header");
        StoreError::Unauthorized("Missing Authorization header".to_string())
    })?;

    let header = header.to_str().map_err(|_| {
        tracing::debug!(target: "store.middleware.auth", "Non-ASCII Authorization header");
        StoreError::InvalidToken("Invalid Authorization header".to_string())
    })?;

    let token = extract_bearer_token(header).map_err(|e| {
        tracing::debug!(target: "store.middleware.auth", "Invalid Authorization header format");
        StoreError::InvalidToken(e.to_string())
    })?;

    verify_token(token, token_secret, clock_skew_seconds)
}

/// Authenticate, then enforce the capability configured in `state`.
#[instrument(skip_all, name = "store.middleware.policy")]
pub async fn enforce_policy(
    State(state): State<Arc<PolicyState>>,
    req: Request,
    next: Next,
) -> Result<Response, StoreError> {
    let claims = authenticate(req.headers(), &state.token_secret, state.clock_skew_seconds)?;

    let (mut parts, body) = req.into_parts();

    let requested_email = match state.capability {
        Capability::Owner(EmailSource::Query(name)) => {
            Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(mut params)| params.remove(name))
        }
        Capability::Owner(EmailSource::PathParam) => {
            Path::<String>::from_request_parts(&mut parts, &state)
                .await
                .ok()
                .map(|Path(email)| email)
        }
        Capability::Authenticated | Capability::Admin => None,
    };

    authorize(
        state.capability,
        state.store.as_ref(),
        &claims,
        requested_email.as_deref(),
    )
    .await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
