//! Producer persistence, keyed on document uniqueness.

use std::sync::Arc;

use agro_core::{Producer, ProducerId};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::executor::{Database, Row, SqlParam, SqlType};
use crate::repository::{ProducerPatch, ProducerRepository};

const RETURNING_PRODUCER: &str = "RETURNING id, name, document, is_active";

pub const NO_PRODUCERS_FOUND: &str = "No producers found.";

/// [`ProducerRepository`] over a [`Database`].
#[derive(Clone)]
pub struct ProducerStore {
    db: Arc<dyn Database>,
}

impl ProducerStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Run a statement expected to return one producer row.
    async fn one(&self, sql: &str, params: &[SqlParam], missing: StoreError) -> StoreResult<Producer> {
        let mut session = self.db.acquire().await?;
        let result = session.query(sql, params).await?;
        match result.rows.first() {
            Some(row) => producer_from_row(row),
            None => Err(missing),
        }
    }
}

fn producer_from_row(row: &Row) -> StoreResult<Producer> {
    Ok(Producer::new(
        Some(ProducerId::new(row.i64("id")?)),
        row.str("name")?,
        row.str("document")?,
        row.opt_bool("is_active")?,
    )?)
}

fn optional_text(value: &Option<String>) -> SqlParam {
    value
        .clone()
        .map_or(SqlParam::Null(SqlType::Text), SqlParam::Text)
}

#[async_trait]
impl ProducerRepository for ProducerStore {
    async fn save(&self, producer: &Producer) -> StoreResult<Producer> {
        debug!(document = %producer.document(), "saveProducer");
        let sql = format!(
            "INSERT INTO producers (name, document, is_active) VALUES ($1, $2, $3) {RETURNING_PRODUCER}"
        );
        self.one(
            &sql,
            &[
                producer.name().as_str().into(),
                producer.document().as_str().into(),
                producer.is_active().into(),
            ],
            StoreError::UnprocessableEntity("Error inserting producer".to_string()),
        )
        .await
    }

    async fn upsert(&self, producer: &Producer) -> StoreResult<Producer> {
        debug!(document = %producer.document(), "upsertProducer");
        let sql = format!(
            "INSERT INTO producers (name, document, is_active) VALUES ($1, $2, $3) \
             ON CONFLICT (document) DO UPDATE SET \
             name = EXCLUDED.name, \
             is_active = EXCLUDED.is_active \
             {RETURNING_PRODUCER}"
        );
        self.one(
            &sql,
            &[
                producer.name().as_str().into(),
                producer.document().as_str().into(),
                producer.is_active().into(),
            ],
            StoreError::UnprocessableEntity("Error inserting/updating producer".to_string()),
        )
        .await
    }

    async fn update(&self, id: ProducerId, patch: &ProducerPatch) -> StoreResult<Producer> {
        debug!(producer_id = %id, ?patch, "updateProducer");
        let sql = format!(
            "UPDATE producers SET \
             name = COALESCE($2, name), \
             document = COALESCE($3, document), \
             is_active = COALESCE($4, is_active) \
             WHERE id = $1 {RETURNING_PRODUCER}"
        );
        self.one(
            &sql,
            &[
                SqlParam::Int(id.get()),
                optional_text(&patch.name),
                optional_text(&patch.document),
                patch
                    .is_active
                    .map_or(SqlParam::Null(SqlType::Bool), SqlParam::Bool),
            ],
            StoreError::UnprocessableEntity("Error updating producer".to_string()),
        )
        .await
    }

    async fn find_by_id(&self, id: ProducerId) -> StoreResult<Producer> {
        debug!(producer_id = %id, "findProducer");
        self.one(
            "SELECT id, name, document, is_active FROM producers WHERE id = $1",
            &[SqlParam::Int(id.get())],
            StoreError::NotFound(NO_PRODUCERS_FOUND.to_string()),
        )
        .await
    }

    async fn delete_by_id(&self, id: ProducerId) -> StoreResult<()> {
        debug!(producer_id = %id, "deleteByIdProducer");
        let mut session = self.db.acquire().await?;
        session
            .query("DELETE FROM producers WHERE id = $1", &[SqlParam::Int(id.get())])
            .await?;
        Ok(())
    }
}
