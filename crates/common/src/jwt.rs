//! JWT utilities shared across the music store crates.
//!
//! Key-independent parts of customer token handling: the claims carried by
//! every access token, size and `iat` checks, and `Bearer` header parsing.
//!
//! Oversized tokens are refused before any decoding, every rejection shares
//! one client-facing message, and claims never print the customer email.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{check_token_size, validate_iat, DEFAULT_CLOCK_SKEW};
//!
//! let token = extract_bearer_token(header)?;
//! check_token_size(token)?;
//! let claims: CustomerClaims = /* HS256 decode */;
//! validate_iat(claims.iat, DEFAULT_CLOCK_SKEW)?;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Upper bound on an encoded token, in bytes.
///
/// Customer tokens carry three claims and an HS256 signature, typically well
/// under 300 bytes. Anything larger is rejected before base64 decoding or
/// signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 4096;

/// How far in the future an `iat` may be before the token is refused.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Largest skew the configuration accepts.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Default lifetime of an issued access token (1 hour).
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Authorization scheme prefix expected on protected requests.
pub const BEARER_PREFIX: &str = "Bearer ";

// =============================================================================
// Error Types
// =============================================================================

/// Key-independent token rejections. All variants display the same text; the
/// reason is only logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Missing `Bearer` scheme or empty token.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Issued later than `now + skew`.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Customer access token claims.
///
/// The only identity a token asserts is the customer's email address. The
/// email is redacted in Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerClaims {
    /// Customer email - redacted in Debug output.
    pub email: String,

    /// Unix seconds.
    pub iat: i64,

    /// Unix seconds.
    pub exp: i64,
}

impl fmt::Debug for CustomerClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerClaims")
            .field("email", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl CustomerClaims {
    /// Build claims for `email` issued at `iat` and valid for `lifetime`.
    #[must_use]
    pub fn new(email: impl Into<String>, iat: i64, lifetime: Duration) -> Self {
        // Safe cast: lifetimes are bounded by configuration to one day
        #[allow(clippy::cast_possible_wrap)]
        let lifetime_secs = lifetime.as_secs() as i64;
        Self {
            email: email.into(),
            iat,
            exp: iat.saturating_add(lifetime_secs),
        }
    }

    /// Whether these claims were issued for exactly `email`.
    ///
    /// Comparison is byte-for-byte; no case folding is applied.
    #[must_use]
    pub fn is_for(&self, email: &str) -> bool {
        self.email == email
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` if the token exceeds the limit.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_bytes = token.len(),
            limit = MAX_JWT_SIZE_BYTES,
            "Refusing oversized access token"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts only the `Bearer <token>` form with a non-empty token.
///
/// # Errors
///
/// Returns `JwtValidationError::MalformedToken` if the scheme is not `Bearer`
/// or the token part is empty.
pub fn extract_bearer_token(header_value: &str) -> Result<&str, JwtValidationError> {
    let token = header_value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(JwtValidationError::MalformedToken)?;

    if token.is_empty() {
        return Err(JwtValidationError::MalformedToken);
    }

    Ok(token)
}

/// Check `iat` against the current time plus `clock_skew`.
///
/// # Errors
///
/// `JwtValidationError::IatTooFarInFuture` when the token claims to be issued
/// after `now + clock_skew`.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// [`validate_iat`] with an explicit clock.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    let skew = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let latest = now.saturating_add(skew);

    if iat <= latest {
        return Ok(());
    }

    tracing::debug!(
        target: "common.jwt",
        iat,
        latest_accepted = latest,
        "Refusing access token issued in the future"
    );
    Err(JwtValidationError::IatTooFarInFuture)
}
