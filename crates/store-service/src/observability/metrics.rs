//! Metrics definitions for the music store gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `store_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `endpoint`: route templates only; emails and ids never appear as labels
//! - `status`: success, error, timeout (HTTP) or success/error elsewhere
//! - `capability`: authenticated, admin, owner
//! - `operation`: bounded by repository methods

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle used by `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("store_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("store_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        // Payment provider calls cross the internet; allow up to the client timeout
        .set_buckets_for_metric(
            Matcher::Prefix("store_payment_intent".to_string()),
            &[0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set payment buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `store_http_requests_total`, `store_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("store_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("store_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/instruments" => "/instruments",
        "/reviews" => "/reviews",
        "/user" => "/user",
        "/order" => "/order",
        "/create-payment-intent" => "/create-payment-intent",
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> &'static str {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match segments.as_slice() {
        ["instruments", id] if !id.is_empty() => "/instruments/{id}",
        ["order", id] if !id.is_empty() => "/order/{id}",
        ["admin", email] if !email.is_empty() => "/admin/{email}",
        ["user", "admin", email] if !email.is_empty() => "/user/admin/{email}",
        ["user", email] if !email.is_empty() => "/user/{email}",
        _ => "/other",
    }
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record access token validation outcome
///
/// Metric: `store_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("store_token_validations_total",
        "status" => status.to_string(),
        "error_category" => category.to_string()
    )
    .increment(1);
}

/// Record access token issuance
///
/// Metric: `store_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str) {
    counter!("store_token_issuance_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record an authorization decision
///
/// Metric: `store_authorization_decisions_total`
/// Labels: `capability`, `outcome` (granted, denied)
pub fn record_authorization_decision(capability: &str, outcome: &str) {
    counter!("store_authorization_decisions_total",
        "capability" => capability.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Payment Metrics
// ============================================================================

/// Record a payment intent creation attempt
///
/// Metric: `store_payment_intents_total`, `store_payment_intent_duration_seconds`
/// Labels: `status`
pub fn record_payment_intent(status: &str, duration: Duration) {
    histogram!("store_payment_intent_duration_seconds").record(duration.as_secs_f64());
    counter!("store_payment_intents_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record a database query
///
/// Metric: `store_db_query_duration_seconds`, `store_db_queries_total`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("store_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("store_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
