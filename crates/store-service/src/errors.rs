//! Music store gateway error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. The body
//! is always `{"message": "..."}`. Messages for server-side failures are
//! generic; the underlying error is logged instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Gateway error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 (no credential presented)
/// - InvalidToken, Forbidden: 403
/// - BadRequest: 400
/// - NotFound: 404
/// - PaymentProvider: 502
/// - Database, Internal: 500
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl StoreError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StoreError::InvalidToken(_) | StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            StoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            StoreError::Database(_) | StoreError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            StoreError::Unauthorized(_) => "Unauthorized access".to_string(),
            StoreError::InvalidToken(_) => "Forbidden access".to_string(),
            StoreError::Forbidden(reason)
            | StoreError::BadRequest(reason)
            | StoreError::NotFound(reason) => reason.clone(),
            StoreError::PaymentProvider(reason) => {
                tracing::warn!(target: "store.payments", reason = %reason, "Payment provider call failed");
                "Payment provider unavailable".to_string()
            }
            StoreError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "store.database", error = %err, "Database operation failed");
                "An internal database error occurred".to_string()
            }
            StoreError::Internal => "An internal error occurred".to_string(),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"music-store\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert sqlx errors to StoreError
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
