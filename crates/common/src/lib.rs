//! Common utilities and types shared across the music store crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (claims, size limits, iat validation, bearer parsing)
pub mod jwt;

/// Module for log-safe correlation of personal identifiers
pub mod redact;
