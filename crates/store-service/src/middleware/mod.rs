//! HTTP middleware for the music store gateway.
//!
//! - `auth` - Token verification and per-route capability enforcement
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{enforce_policy, PolicyState};
pub use http_metrics::http_metrics_middleware;
