//! Document models for the music store.
//!
//! Every document travels as a flat JSON object: `_id`, the typed keys of the
//! collection in camelCase, and free-form fields merged in at the top level.
//! Free-form fields never shadow the typed keys; see [`strip_reserved`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form document fields.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Document identifier key shared by all collections.
pub const ID_KEY: &str = "_id";

/// Keys a user profile may not carry as free-form fields.
pub const USER_RESERVED_KEYS: &[&str] = &[ID_KEY, "email", "userType"];

/// Keys an order may not carry as free-form fields.
pub const ORDER_RESERVED_KEYS: &[&str] = &[ID_KEY, "customerEmail", "price"];

/// Keys a catalog or review document may not carry as free-form fields.
pub const DOCUMENT_RESERVED_KEYS: &[&str] = &[ID_KEY];

/// Maximum email length accepted in paths and bodies (RFC 5321).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Remove keys that are stored in typed columns.
pub fn strip_reserved(fields: &mut Fields, reserved: &[&str]) {
    for key in reserved {
        fields.remove(*key);
    }
}

/// Basic shape check for emails used as document keys.
///
/// Emails are compared byte-for-byte everywhere, so no normalization is
/// applied here beyond rejecting obviously unusable values.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() {
        return Err("Email must not be empty");
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err("Email is too long");
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Email must not contain whitespace");
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err("Email must contain a local part and a domain"),
    }
}

// ============================================================================
// Catalog and reviews
// ============================================================================

/// Catalog item. Read-only through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Customer review. Append-only and not linked to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Fields,
}

// ============================================================================
// Orders
// ============================================================================

/// Stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub customer_email: String,
    pub price: f64,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Order as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_email: String,
    pub price: f64,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NewOrder {
    /// Validate the typed keys and drop reserved free-form fields.
    pub fn validate(mut self) -> Result<Self, String> {
        validate_email(&self.customer_email).map_err(|e| format!("Invalid customerEmail: {e}"))?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("price must be a non-negative number".to_string());
        }
        strip_reserved(&mut self.fields, ORDER_RESERVED_KEYS);
        Ok(self)
    }
}

/// Query string of `GET /order`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub customer_email: String,
}

// ============================================================================
// Users
// ============================================================================

/// Coarse permission tag stored per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Parse a stored role. Anything other than `admin` is a customer.
    pub fn from_db(value: &str) -> Self {
        if value == "admin" {
            Role::Admin
        } else {
            Role::Customer
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    fn is_customer(&self) -> bool {
        matches!(self, Role::Customer)
    }
}

/// Stored user account.
///
/// `userType` is only present on the wire for admins, matching documents
/// that never had a role assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Role::is_customer")]
    pub user_type: Role,
    #[serde(flatten)]
    pub profile: Fields,
}

// ============================================================================
// Write acknowledgements
// ============================================================================

/// Acknowledgement of a single-document insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

impl InsertResult {
    pub fn inserted(id: Uuid) -> Self {
        Self {
            acknowledged: true,
            inserted_id: id,
        }
    }
}

/// Acknowledgement of an update or upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Uuid>,
}

impl UpdateResult {
    /// A new document was created by an upsert.
    pub fn upserted(id: Uuid) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id),
        }
    }

    /// An existing document matched; `modified` tells whether it changed.
    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_count: 0,
            upserted_id: None,
        }
    }

    /// No document matched the filter.
    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

/// Acknowledgement of a multi-document delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn deleted(count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count: count,
        }
    }
}

// ============================================================================
// Response bodies
// ============================================================================

/// Response of `PUT /user/:email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUserResponse {
    pub result: UpdateResult,
    pub token: String,
}

/// Response of `POST /order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub result: InsertResult,
}

/// Response of `GET /admin/:email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStatusResponse {
    pub admin: bool,
}

/// Request body of `POST /create-payment-intent`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentRequest {
    pub price: f64,
}

/// Response of `POST /create-payment-intent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Readiness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
