//! Repository layer for the music store.
//!
//! Each collection has a repository trait; [`Store`] bundles them together
//! with a readiness ping. The store is built once in `main` and handed to
//! handlers through `AppState` as an `Arc<dyn Store>`.
//!
//! Implementations:
//! - [`PgStore`]: PostgreSQL, documents kept as `JSONB` next to typed key columns
//! - [`MemoryStore`]: in-process store for tests and local runs

pub mod instruments;
pub mod memory;
pub mod orders;
pub mod reviews;
pub mod users;

pub use memory::MemoryStore;

use crate::errors::StoreError;
use crate::models::{
    DeleteResult, Fields, Instrument, InsertResult, NewOrder, Order, Review, Role, UpdateResult,
    User,
};
use crate::observability::metrics;
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

/// Read access to the instrument catalog.
#[async_trait]
pub trait InstrumentRepository: Send + Sync {
    /// All instruments in insertion order.
    async fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError>;

    /// A single instrument, or `None` if no document has `id`.
    async fn get_instrument(&self, id: Uuid) -> Result<Option<Instrument>, StoreError>;
}

/// Append-only review collection.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn list_reviews(&self) -> Result<Vec<Review>, StoreError>;

    async fn insert_review(&self, fields: Fields) -> Result<InsertResult, StoreError>;
}

/// Orders, keyed for access purposes by customer email.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertResult, StoreError>;

    /// Orders whose `customerEmail` equals `email` exactly.
    async fn list_orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Delete every order whose `customerEmail` equals `email` exactly.
    async fn delete_orders_by_email(&self, email: &str) -> Result<DeleteResult, StoreError>;
}

/// User accounts keyed by email.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Create the user or merge `profile` into the existing one.
    ///
    /// `profile` must already be stripped of reserved keys; the role is never
    /// changed by an upsert.
    async fn upsert_user(&self, email: &str, profile: Fields) -> Result<UpdateResult, StoreError>;

    /// Stored role for `email`, or `None` if there is no such user.
    async fn get_role(&self, email: &str) -> Result<Option<Role>, StoreError>;

    /// Set the role of an existing user to admin. Never creates a user.
    async fn promote_to_admin(&self, email: &str) -> Result<UpdateResult, StoreError>;
}

/// Complete data-access surface used by the gateway.
#[async_trait]
pub trait Store: InstrumentRepository + ReviewRepository + OrderRepository + UserRepository {
    /// Cheap connectivity check for the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = sqlx::query("SELECT 1").fetch_one(&self.pool).await;
        record_query("ping", result.is_ok(), start);
        result?;
        Ok(())
    }
}

/// Record DB query metrics for one repository operation.
pub(crate) fn record_query(operation: &str, ok: bool, start: Instant) {
    let status = if ok { "success" } else { "error" };
    metrics::record_db_query(operation, status, start.elapsed());
}
