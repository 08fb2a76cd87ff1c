//! In-process store.
//!
//! Mirrors [`PgStore`](super::PgStore) semantics (exact email matching,
//! profile merge on upsert, promotion without creation) so handlers can be
//! exercised without PostgreSQL. A failing mode makes every operation return
//! `StoreError::Database`.

use super::{InstrumentRepository, OrderRepository, ReviewRepository, Store, UserRepository};
use crate::errors::StoreError;
use crate::models::{
    DeleteResult, Fields, Instrument, InsertResult, NewOrder, Order, Review, Role, UpdateResult,
    User,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    instruments: Vec<Instrument>,
    reviews: Vec<Review>,
    orders: Vec<Order>,
    users: Vec<User>,
}

/// Store that keeps every collection in memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every operation fails.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    /// Switch the failing mode on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Add a catalog item and return its id.
    pub async fn seed_instrument(&self, fields: Fields) -> Uuid {
        let id = Uuid::new_v4();
        self.collections
            .write()
            .await
            .instruments
            .push(Instrument { id, fields });
        id
    }

    /// Add a user with an explicit role and return its id.
    pub async fn seed_user(&self, email: &str, role: Role, profile: Fields) -> Uuid {
        let id = Uuid::new_v4();
        self.collections.write().await.users.push(User {
            id,
            email: email.to_string(),
            user_type: role,
            profile,
        });
        id
    }

    /// Add an order and return its id.
    pub async fn seed_order(&self, customer_email: &str, price: f64, fields: Fields) -> Uuid {
        let id = Uuid::new_v4();
        self.collections.write().await.orders.push(Order {
            id,
            customer_email: customer_email.to_string(),
            price,
            fields,
        });
        id
    }

    /// Snapshot of all stored orders.
    pub async fn orders(&self) -> Vec<Order> {
        self.collections.read().await.orders.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "memory store is in failing mode".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InstrumentRepository for MemoryStore {
    async fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        self.check_available()?;
        Ok(self.collections.read().await.instruments.clone())
    }

    async fn get_instrument(&self, id: Uuid) -> Result<Option<Instrument>, StoreError> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .instruments
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list_reviews(&self) -> Result<Vec<Review>, StoreError> {
        self.check_available()?;
        Ok(self.collections.read().await.reviews.clone())
    }

    async fn insert_review(&self, fields: Fields) -> Result<InsertResult, StoreError> {
        self.check_available()?;
        let id = Uuid::new_v4();
        self.collections
            .write()
            .await
            .reviews
            .push(Review { id, fields });
        Ok(InsertResult::inserted(id))
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertResult, StoreError> {
        self.check_available()?;
        let id = Uuid::new_v4();
        self.collections.write().await.orders.push(Order {
            id,
            customer_email: order.customer_email,
            price: order.price,
            fields: order.fields,
        });
        Ok(InsertResult::inserted(id))
    }

    async fn list_orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .orders
            .iter()
            .filter(|o| o.customer_email == email)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn delete_orders_by_email(&self, email: &str) -> Result<DeleteResult, StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;
        let before = collections.orders.len();
        collections.orders.retain(|o| o.customer_email != email);
        let deleted = before - collections.orders.len();
        Ok(DeleteResult::deleted(deleted as u64))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.check_available()?;
        Ok(self.collections.read().await.users.clone())
    }

    async fn upsert_user(&self, email: &str, profile: Fields) -> Result<UpdateResult, StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        match collections.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                let previous = user.profile.clone();
                user.profile.extend(profile);
                Ok(UpdateResult::matched(previous != user.profile))
            }
            None => {
                let id = Uuid::new_v4();
                collections.users.push(User {
                    id,
                    email: email.to_string(),
                    user_type: Role::Customer,
                    profile,
                });
                Ok(UpdateResult::upserted(id))
            }
        }
    }

    async fn get_role(&self, email: &str) -> Result<Option<Role>, StoreError> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.user_type))
    }

    async fn promote_to_admin(&self, email: &str) -> Result<UpdateResult, StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        match collections.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                let modified = !user.user_type.is_admin();
                user.user_type = Role::Admin;
                Ok(UpdateResult::matched(modified))
            }
            None => Ok(UpdateResult::unmatched()),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
