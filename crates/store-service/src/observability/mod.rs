//! Observability for the music store gateway.
//!
//! # Privacy by Default
//!
//! Handlers and services use `#[instrument(skip_all)]` and record only
//! explicitly safe fields:
//! - **SAFE**: plaintext (ids, counts, capability names, outcomes)
//! - **HASHED**: customer emails, via [`common::redact::hash_for_correlation`]
//! - **NEVER**: tokens, signing secrets, payment keys, client secrets

pub mod metrics;
