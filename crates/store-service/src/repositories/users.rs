//! User account queries.
//!
//! Users are keyed by email. Profile upserts merge top-level fields into the
//! stored profile; the role column is only written by [`promote_to_admin`].
//!
//! [`promote_to_admin`]: super::UserRepository::promote_to_admin

use super::{record_query, PgStore, UserRepository};
use crate::errors::StoreError;
use crate::models::{Fields, Role, UpdateResult, User};
use async_trait::async_trait;
use common::redact::hash_for_correlation;
use sqlx::types::Json;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    user_type: String,
    profile: Json<Fields>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            user_type: Role::from_db(&row.user_type),
            profile: row.profile.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    id: Uuid,
    inserted: bool,
    profile: Json<Fields>,
    previous_profile: Option<Json<Fields>>,
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip_all)]
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, user_type, profile
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await;
        record_query("list_users", result.is_ok(), start);

        Ok(result?.into_iter().map(User::from).collect())
    }

    #[instrument(skip_all)]
    async fn upsert_user(&self, email: &str, profile: Fields) -> Result<UpdateResult, StoreError> {
        let start = Instant::now();

        // The CTE reads the pre-statement snapshot, so `previous_profile` is
        // the profile as it was before this upsert.
        let result = sqlx::query_as::<_, UpsertRow>(
            r#"
            WITH previous AS (
                SELECT profile FROM users WHERE email = $1
            )
            INSERT INTO users (email, profile)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET
                profile = users.profile || EXCLUDED.profile,
                updated_at = NOW()
            RETURNING
                id,
                (xmax = 0) AS inserted,
                profile,
                (SELECT profile FROM previous) AS previous_profile
            "#,
        )
        .bind(email)
        .bind(Json(profile))
        .fetch_one(self.pool())
        .await;
        record_query("upsert_user", result.is_ok(), start);

        let row = result?;
        let update = if row.inserted {
            UpdateResult::upserted(row.id)
        } else {
            let modified = row.previous_profile.map(|p| p.0) != Some(row.profile.0);
            UpdateResult::matched(modified)
        };

        tracing::info!(
            target: "store.repository.users",
            user = %hash_for_correlation(email),
            inserted = row.inserted,
            modified = update.modified_count,
            "User upserted"
        );
        Ok(update)
    }

    #[instrument(skip_all)]
    async fn get_role(&self, email: &str) -> Result<Option<Role>, StoreError> {
        let start = Instant::now();
        let result: Result<Option<String>, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT user_type
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await;
        record_query("get_role", result.is_ok(), start);

        Ok(result?.map(|role| Role::from_db(&role)))
    }

    #[instrument(skip_all)]
    async fn promote_to_admin(&self, email: &str) -> Result<UpdateResult, StoreError> {
        let start = Instant::now();
        let result: Result<Option<String>, sqlx::Error> = sqlx::query_scalar(
            r#"
            WITH previous AS (
                SELECT id, user_type FROM users WHERE email = $1 FOR UPDATE
            )
            UPDATE users
            SET user_type = 'admin', updated_at = NOW()
            FROM previous
            WHERE users.id = previous.id
            RETURNING previous.user_type
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await;
        record_query("promote_to_admin", result.is_ok(), start);

        let update = match result? {
            None => UpdateResult::unmatched(),
            Some(previous) => UpdateResult::matched(!Role::from_db(&previous).is_admin()),
        };

        tracing::info!(
            target: "store.repository.users",
            user = %hash_for_correlation(email),
            matched = update.matched_count,
            modified = update.modified_count,
            "Admin promotion applied"
        );
        Ok(update)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::PgPool;

    fn profile(value: serde_json::Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_upsert_creates_then_merges(pool: PgPool) {
        let store = PgStore::new(pool);

        let created = store
            .upsert_user("alice@example.com", profile(json!({ "name": "Alice" })))
            .await
            .unwrap();
        assert_eq!(created.upserted_count, 1);
        assert!(created.upserted_id.is_some());

        let merged = store
            .upsert_user("alice@example.com", profile(json!({ "city": "Oslo" })))
            .await
            .unwrap();
        assert_eq!(merged.matched_count, 1);
        assert_eq!(merged.modified_count, 1);

        let users = store.list_users().await.unwrap();
        let alice = users.first().unwrap();
        assert_eq!(alice.profile["name"], "Alice");
        assert_eq!(alice.profile["city"], "Oslo");
        assert_eq!(alice.user_type, Role::Customer);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_upsert_identical_profile_is_not_modified(pool: PgPool) {
        let store = PgStore::new(pool);
        let body = json!({ "name": "Alice" });

        store.upsert_user("alice@example.com", profile(body.clone())).await.unwrap();
        let again = store.upsert_user("alice@example.com", profile(body)).await.unwrap();

        assert_eq!(again.matched_count, 1);
        assert_eq!(again.modified_count, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_promote_to_admin(pool: PgPool) {
        let store = PgStore::new(pool);
        store.upsert_user("bob@example.com", Fields::new()).await.unwrap();
        assert_eq!(store.get_role("bob@example.com").await.unwrap(), Some(Role::Customer));

        let first = store.promote_to_admin("bob@example.com").await.unwrap();
        assert_eq!(first.modified_count, 1);
        assert_eq!(store.get_role("bob@example.com").await.unwrap(), Some(Role::Admin));

        let second = store.promote_to_admin("bob@example.com").await.unwrap();
        assert_eq!(second.matched_count, 1);
        assert_eq!(second.modified_count, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_promote_unknown_user_matches_nothing(pool: PgPool) {
        let store = PgStore::new(pool);

        let result = store.promote_to_admin("ghost@example.com").await.unwrap();
        assert_eq!(result, UpdateResult::unmatched());
        assert!(store.get_role("ghost@example.com").await.unwrap().is_none());
    }
}
