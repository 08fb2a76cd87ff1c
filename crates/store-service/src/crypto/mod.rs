//! Customer access token signing and verification.
//!
//! Tokens are HS256 JWTs signed with the configured `ACCESS_TOKEN_SECRET`
//! and carry [`CustomerClaims`]. Verification checks, in order: size,
//! signature, expiry, then `iat` against the configured clock skew.

use crate::errors::StoreError;
use crate::observability::metrics::{record_token_issuance, record_token_validation};
use common::jwt::{check_token_size, validate_iat, CustomerClaims};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::instrument;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// Sign an access token for `email` valid for `lifetime_seconds`.
#[instrument(skip_all)]
pub fn issue_token(
    email: &str,
    secret: &SecretString,
    lifetime_seconds: i64,
) -> Result<String, StoreError> {
    let now = chrono::Utc::now().timestamp();
    let lifetime = Duration::from_secs(u64::try_from(lifetime_seconds).unwrap_or(0));
    let claims = CustomerClaims::new(email, now, lifetime);

    match sign_claims(&claims, secret) {
        Ok(token) => {
            record_token_issuance("success");
            Ok(token)
        }
        Err(e) => {
            record_token_issuance("error");
            Err(e)
        }
    }
}

/// Sign arbitrary claims with HS256.
#[instrument(skip_all)]
pub fn sign_claims(claims: &CustomerClaims, secret: &SecretString) -> Result<String, StoreError> {
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &encoding_key).map_err(|e| {
        tracing::error!(target: "store.crypto", error = %e, "JWT signing operation failed");
        StoreError::Internal
    })
}

/// Verify an access token and return its claims.
///
/// Validates:
/// - Token size (must be <= `MAX_JWT_SIZE_BYTES`), before any parsing
/// - Signature (HS256 only; other algorithms are rejected)
/// - Expiration (`exp` claim, with the library's default leeway)
/// - Issued-at (`iat` claim) no further than `clock_skew_seconds` in the future
#[instrument(skip_all)]
pub fn verify_token(
    token: &str,
    secret: &SecretString,
    clock_skew_seconds: i64,
) -> Result<CustomerClaims, StoreError> {
    if check_token_size(token).is_err() {
        record_token_validation("error", Some("too_large"));
        return Err(StoreError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string()));
    }

    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<CustomerClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "store.crypto", error = %e, "Token verification failed");
        record_token_validation("error", Some(classify_jwt_error(&e)));
        StoreError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
    })?;

    let clock_skew = Duration::from_secs(u64::try_from(clock_skew_seconds).unwrap_or(0));
    if validate_iat(token_data.claims.iat, clock_skew).is_err() {
        // Enables alerting on clock drift between issuers and this service
        record_token_validation("error", Some("clock_skew"));
        return Err(StoreError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string()));
    }

    record_token_validation("success", None);
    Ok(token_data.claims)
}

/// Bounded label for token validation failures.
fn classify_jwt_error(err: &jsonwebtoken::errors::Error) -> &'static str {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => "expired",
        ErrorKind::InvalidSignature => "signature",
        ErrorKind::InvalidAlgorithm => "algorithm",
        _ => "malformed",
    }
}
