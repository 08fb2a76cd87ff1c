//! Order queries.
//!
//! Ownership is not enforced here; callers check the customer email against
//! the verified token before reaching the repository.

use super::{record_query, OrderRepository, PgStore};
use crate::errors::StoreError;
use crate::models::{DeleteResult, Fields, InsertResult, NewOrder, Order};
use async_trait::async_trait;
use common::redact::hash_for_correlation;
use sqlx::types::Json;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_email: String,
    price: f64,
    body: Json<Fields>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            customer_email: row.customer_email,
            price: row.price,
            fields: row.body.0,
        }
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    #[instrument(skip_all)]
    async fn insert_order(&self, order: NewOrder) -> Result<InsertResult, StoreError> {
        let start = Instant::now();
        let result: Result<Uuid, sqlx::Error> = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_email, price, body)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&order.customer_email)
        .bind(order.price)
        .bind(Json(order.fields))
        .fetch_one(self.pool())
        .await;
        record_query("insert_order", result.is_ok(), start);

        let id = result?;
        tracing::info!(
            target: "store.repository.orders",
            order_id = %id,
            customer = %hash_for_correlation(&order.customer_email),
            "Order inserted"
        );
        Ok(InsertResult::inserted(id))
    }

    #[instrument(skip_all)]
    async fn list_orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, customer_email, price, body
            FROM orders
            WHERE customer_email = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(email)
        .fetch_all(self.pool())
        .await;
        record_query("list_orders_by_email", result.is_ok(), start);

        Ok(result?.into_iter().map(Order::from).collect())
    }

    #[instrument(skip_all, fields(order_id = %id))]
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, customer_email, price, body
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await;
        record_query("get_order", result.is_ok(), start);

        Ok(result?.map(Order::from))
    }

    #[instrument(skip_all)]
    async fn delete_orders_by_email(&self, email: &str) -> Result<DeleteResult, StoreError> {
        let start = Instant::now();
        let result = sqlx::query(
            r#"
            DELETE FROM orders
            WHERE customer_email = $1
            "#,
        )
        .bind(email)
        .execute(self.pool())
        .await;
        record_query("delete_orders_by_email", result.is_ok(), start);

        let deleted = result?.rows_affected();
        tracing::info!(
            target: "store.repository.orders",
            customer = %hash_for_correlation(email),
            deleted,
            "Orders deleted"
        );
        Ok(DeleteResult::deleted(deleted))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn new_order(email: &str, price: f64) -> NewOrder {
        let mut fields = Fields::new();
        fields.insert("instrument".to_string(), serde_json::json!("Flute"));
        NewOrder {
            customer_email: email.to_string(),
            price,
            fields,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_orders_are_filtered_by_exact_email(pool: PgPool) {
        let store = PgStore::new(pool);
        store.insert_order(new_order("alice@example.com", 10.0)).await.unwrap();
        store.insert_order(new_order("alice@example.com", 20.0)).await.unwrap();
        store.insert_order(new_order("Alice@example.com", 30.0)).await.unwrap();

        let orders = store.list_orders_by_email("alice@example.com").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.customer_email == "alice@example.com"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_get_order_round_trips_fields(pool: PgPool) {
        let store = PgStore::new(pool);
        let inserted = store.insert_order(new_order("bob@example.com", 15.5)).await.unwrap();

        let order = store.get_order(inserted.inserted_id).await.unwrap().unwrap();
        assert_eq!(order.customer_email, "bob@example.com");
        assert_eq!(order.price, 15.5);
        assert_eq!(order.fields["instrument"], "Flute");
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_delete_orders_by_email_counts(pool: PgPool) {
        let store = PgStore::new(pool);
        store.insert_order(new_order("carol@example.com", 1.0)).await.unwrap();
        store.insert_order(new_order("carol@example.com", 2.0)).await.unwrap();
        store.insert_order(new_order("dave@example.com", 3.0)).await.unwrap();

        let result = store.delete_orders_by_email("carol@example.com").await.unwrap();
        assert_eq!(result.deleted_count, 2);
        assert_eq!(store.list_orders_by_email("dave@example.com").await.unwrap().len(), 1);
    }
}
