//! Instrument catalog queries.

use super::{record_query, InstrumentRepository, PgStore};
use crate::errors::StoreError;
use crate::models::{Fields, Instrument};
use async_trait::async_trait;
use sqlx::types::Json;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Fields>,
}

impl From<DocumentRow> for Instrument {
    fn from(row: DocumentRow) -> Self {
        Instrument {
            id: row.id,
            fields: row.body.0,
        }
    }
}

#[async_trait]
impl InstrumentRepository for PgStore {
    #[instrument(skip_all)]
    async fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, body
            FROM instruments
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await;
        record_query("list_instruments", result.is_ok(), start);

        Ok(result?.into_iter().map(Instrument::from).collect())
    }

    #[instrument(skip_all, fields(instrument_id = %id))]
    async fn get_instrument(&self, id: Uuid) -> Result<Option<Instrument>, StoreError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, body
            FROM instruments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await;
        record_query("get_instrument", result.is_ok(), start);

        Ok(result?.map(Instrument::from))
    }
}
