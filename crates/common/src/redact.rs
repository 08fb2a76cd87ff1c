//! Log-safe correlation of personal identifiers.
//!
//! Customer emails never appear in logs in plaintext. Where a log line needs
//! to correlate requests for the same customer it records
//! [`hash_for_correlation`] of the email instead.

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// This is a one-way correlation aid, not a secure digest. The truncation
/// keeps entries distinguishable while limiting reversibility.
#[must_use]
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}
