//! Review queries.

use super::{record_query, PgStore, ReviewRepository};
use crate::errors::StoreError;
use crate::models::{Fields, InsertResult, Review};
use async_trait::async_trait;
use sqlx::types::Json;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    body: Json<Fields>,
}

#[async_trait]
impl ReviewRepository for PgStore {
    #[instrument(skip_all)]
    async fn list_reviews(&self) -> Result<Vec<Review>, StoreError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, body
            FROM reviews
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await;
        record_query("list_reviews", result.is_ok(), start);

        Ok(result?
            .into_iter()
            .map(|row| Review {
                id: row.id,
                fields: row.body.0,
            })
            .collect())
    }

    #[instrument(skip_all)]
    async fn insert_review(&self, fields: Fields) -> Result<InsertResult, StoreError> {
        let start = Instant::now();
        let result: Result<Uuid, sqlx::Error> = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (body)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(Json(fields))
        .fetch_one(self.pool())
        .await;
        record_query("insert_review", result.is_ok(), start);

        let id = result?;
        tracing::info!(target: "store.repository.reviews", review_id = %id, "Review inserted");
        Ok(InsertResult::inserted(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_insert_then_list_reviews(pool: PgPool) {
        let store = PgStore::new(pool);
        let mut fields = Fields::new();
        fields.insert("rating".to_string(), serde_json::json!(5));

        let result = store.insert_review(fields).await.unwrap();
        assert!(result.acknowledged);

        let reviews = store.list_reviews().await.unwrap();
        assert_eq!(reviews.len(), 1);
        let review = reviews.first().unwrap();
        assert_eq!(review.id, result.inserted_id);
        assert_eq!(review.fields["rating"], 5);
    }
}
