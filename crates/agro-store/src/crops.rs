//! Crop catalogue lookup.

use std::sync::Arc;

use agro_core::{Crop, CropId};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::executor::{Database, SqlParam};
use crate::repository::{CropCriteria, CropRepository, Criterion};

pub const NO_CRITERIA: &str = "At least one of 'id' or 'name' must be provided.";
pub const NO_CROPS_FOUND: &str = "No crops found with the given criteria.";

/// [`CropRepository`] over a [`Database`].
#[derive(Clone)]
pub struct CropStore {
    db: Arc<dyn Database>,
}

impl CropStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn condition<T>(
    column: &str,
    criterion: &Criterion<T>,
    params: &mut Vec<SqlParam>,
    one: impl Fn(&T) -> SqlParam,
    many: impl Fn(&[T]) -> SqlParam,
) -> String {
    match criterion {
        Criterion::One(value) => {
            params.push(one(value));
            format!("{column} = ${}", params.len())
        }
        Criterion::Any(values) => {
            params.push(many(values));
            format!("{column} = ANY(${})", params.len())
        }
    }
}

/// Build the lookup statement and its parameters.
fn lookup_query(criteria: &CropCriteria) -> StoreResult<(String, Vec<SqlParam>)> {
    if criteria.id.is_none() && criteria.name.is_none() {
        return Err(StoreError::InvalidParams(NO_CRITERIA.to_string()));
    }
    let mut params = Vec::new();
    let mut conditions = Vec::new();
    if let Some(id) = &criteria.id {
        conditions.push(condition(
            "id",
            id,
            &mut params,
            |id| SqlParam::Int(id.get()),
            |ids| SqlParam::IntArray(ids.iter().map(CropId::get).collect()),
        ));
    }
    if let Some(name) = &criteria.name {
        conditions.push(condition(
            "name",
            name,
            &mut params,
            |name| SqlParam::Text(name.clone()),
            |names| SqlParam::TextArray(names.to_vec()),
        ));
    }
    let sql = format!(
        "SELECT id, name FROM crops WHERE {} ORDER BY id",
        conditions.join(" AND ")
    );
    Ok((sql, params))
}

#[async_trait]
impl CropRepository for CropStore {
    async fn find(&self, criteria: &CropCriteria) -> StoreResult<Vec<Crop>> {
        debug!(?criteria, "findCrop");
        let (sql, params) = lookup_query(criteria)?;
        let mut session = self.db.acquire().await?;
        let result = session.query(&sql, &params).await?;
        if result.rows.is_empty() {
            return Err(StoreError::NotFound(NO_CROPS_FOUND.to_string()));
        }
        result
            .rows
            .iter()
            .map(|row| -> StoreResult<Crop> {
                let id = CropId::new(row.i64("id")?);
                let name = row.opt_str("name")?.map(str::to_string);
                Ok(Crop::new(id, name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Row, SqlValue};
    use crate::testing::ScriptedDatabase;

    fn crop_row(id: i64, name: &str) -> Row {
        Row::default()
            .with("id", SqlValue::Int(id))
            .with("name", SqlValue::Text(name.into()))
    }

    #[tokio::test]
    async fn requires_a_criterion() {
        let db = ScriptedDatabase::new();
        let store = CropStore::new(Arc::new(db.clone()));
        let err = store.find(&CropCriteria::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidParams(ref t) if t == NO_CRITERIA));
        assert!(db.executed().is_empty());
    }

    #[tokio::test]
    async fn looks_up_ids_as_a_set() {
        let db = ScriptedDatabase::new();
        db.push_rows(vec![crop_row(1, "Soja"), crop_row(2, "Milho")]);
        let store = CropStore::new(Arc::new(db.clone()));

        let crops = store
            .find(&CropCriteria::ids(vec![CropId::new(1), CropId::new(2)]))
            .await
            .unwrap();
        assert_eq!(crops.len(), 2);
        assert_eq!(crops[1].name.as_deref(), Some("Milho"));

        let executed = db.executed();
        assert!(executed[0].sql.contains("WHERE id = ANY($1)"));
        assert_eq!(executed[0].params, vec![SqlParam::IntArray(vec![1, 2])]);
    }

    #[tokio::test]
    async fn joins_id_and_name_with_and() {
        let db = ScriptedDatabase::new();
        db.push_rows(vec![crop_row(3, "Café")]);
        let store = CropStore::new(Arc::new(db.clone()));
        let criteria = CropCriteria {
            id: Some(Criterion::One(CropId::new(3))),
            name: Some(Criterion::One("Café".into())),
        };
        store.find(&criteria).await.unwrap();

        let executed = db.executed();
        assert!(executed[0].sql.contains("id = $1 AND name = $2"));
        assert_eq!(
            executed[0].params,
            vec![SqlParam::Int(3), SqlParam::Text("Café".into())]
        );
    }

    #[tokio::test]
    async fn no_match_is_not_found() {
        let db = ScriptedDatabase::new();
        let store = CropStore::new(Arc::new(db));
        let err = store
            .find(&CropCriteria::names(vec!["Trigo".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref t) if t == NO_CROPS_FOUND));
    }
}
