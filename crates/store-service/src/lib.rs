//! Music Store Gateway Library
//!
//! HTTP API in front of the music store's document collections
//! (instruments, reviews, orders, users) with:
//!
//! - Email-scoped access tokens issued on profile upsert
//! - Per-route capabilities: authenticated, admin, owner-of-email
//! - Payment intent creation with an external provider
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs (policy) -> handlers/*.rs
//!               -> repositories/*.rs (Store) | services/payments.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `crypto` - Access token signing and verification
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Policy enforcement and HTTP metrics
//! - `models` - Documents, write results and response bodies
//! - `observability` - Prometheus metrics
//! - `policy` - Capabilities and ownership/admin checks
//! - `repositories` - `Store` trait, PostgreSQL and in-memory implementations
//! - `routes` - Axum router setup
//! - `services` - Payment provider client

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod policy;
pub mod repositories;
pub mod routes;
pub mod services;
