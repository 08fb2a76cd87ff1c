//! Route authorization policy.
//!
//! Every protected route declares one [`Capability`]. The policy middleware
//! (`middleware::auth::enforce_policy`) authenticates the bearer token and
//! then evaluates the capability. Handlers that check ownership against a
//! stored resource call [`ensure_owner`] themselves, so both paths share one
//! comparison.

use crate::errors::StoreError;
use crate::observability::metrics::record_authorization_decision;
use crate::repositories::Store;
use common::jwt::CustomerClaims;
use common::redact::hash_for_correlation;
use tracing::instrument;

/// Message returned when the caller is not the owner of a resource.
pub const NOT_OWNER_MESSAGE: &str = "forbidden access";

/// Message returned when the caller lacks the admin role.
pub const NOT_ADMIN_MESSAGE: &str = "forbidden";

/// Where an owner check takes the expected email from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSource {
    /// A query string parameter with the given name.
    Query(&'static str),
    /// The route's single path parameter.
    PathParam,
}

/// What a caller must prove to reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any valid access token.
    Authenticated,
    /// A valid token whose email belongs to a stored admin.
    Admin,
    /// A valid token whose email equals the one named by the request.
    Owner(EmailSource),
}

impl Capability {
    /// Bounded label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Capability::Authenticated => "authenticated",
            Capability::Admin => "admin",
            Capability::Owner(_) => "owner",
        }
    }
}

/// Require that the verified caller is `email`.
///
/// Comparison is exact; a missing email never matches.
pub fn ensure_owner(claims: &CustomerClaims, email: Option<&str>) -> Result<(), StoreError> {
    match email {
        Some(email) if claims.is_for(email) => {
            record_authorization_decision("owner", "granted");
            Ok(())
        }
        _ => {
            tracing::debug!(
                target: "store.policy",
                caller = %hash_for_correlation(&claims.email),
                requested = %email.map(hash_for_correlation).unwrap_or_default(),
                "Owner check failed"
            );
            record_authorization_decision("owner", "denied");
            Err(StoreError::Forbidden(NOT_OWNER_MESSAGE.to_string()))
        }
    }
}

/// Require that the verified caller has the stored admin role.
///
/// A caller with no user record is denied.
#[instrument(skip_all, name = "store.policy.ensure_admin")]
pub async fn ensure_admin(store: &dyn Store, claims: &CustomerClaims) -> Result<(), StoreError> {
    let role = store.get_role(&claims.email).await?;

    if role.is_some_and(|r| r.is_admin()) {
        record_authorization_decision("admin", "granted");
        return Ok(());
    }

    tracing::debug!(
        target: "store.policy",
        caller = %hash_for_correlation(&claims.email),
        has_record = role.is_some(),
        "Admin check failed"
    );
    record_authorization_decision("admin", "denied");
    Err(StoreError::Forbidden(NOT_ADMIN_MESSAGE.to_string()))
}

/// Evaluate `capability` for an authenticated caller.
///
/// `requested_email` is the email named by the request for owner checks,
/// already extracted from the source the capability names.
pub async fn authorize(
    capability: Capability,
    store: &dyn Store,
    claims: &CustomerClaims,
    requested_email: Option<&str>,
) -> Result<(), StoreError> {
    match capability {
        Capability::Authenticated => {
            record_authorization_decision("authenticated", "granted");
            Ok(())
        }
        Capability::Admin => ensure_admin(store, claims).await,
        Capability::Owner(_) => ensure_owner(claims, requested_email),
    }
}
