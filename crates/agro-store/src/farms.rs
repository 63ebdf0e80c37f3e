//! # Farm Aggregate Store
//!
//! Persists a producer's farms together with their farm↔crop links.
//! `save_many`, `update_many` and `delete_by_producer_id` each run as one
//! transaction on one session; the write statements return only ids, and
//! the committed state is read back through the joined select and folded
//! by [`group_by_farm`].

use std::sync::Arc;

use agro_core::{Farm, FarmId, ProducerId};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::dashboard::{dashboard_from_row, Dashboard, DASHBOARD_SQL};
use crate::error::{StoreError, StoreResult, UNMAPPED_TITLE};
use crate::executor::{Database, Row, Session, SqlParam, SqlType};
use crate::reconstruct::{farm_from_row, group_by_farm, FARM_CROP_SELECT};
use crate::repository::FarmRepository;
use crate::sql::{values_list, values_list_with_first};
use crate::transaction::{begin, settle};

const FARM_COLUMNS: &str = "name, city, state, total_area_hectares, arable_area_hectares, \
                            vegetation_area_hectares, id_producer";
const FARM_COLUMN_COUNT: usize = 7;
const RETURNING_FARM: &str = "RETURNING id, name, city, state, total_area_hectares, \
                              arable_area_hectares, vegetation_area_hectares, id_producer";

/// Allocates an id for rows that arrive without one.
const ID_OR_NEXT: &str = "COALESCE({}::bigint, nextval(pg_get_serial_sequence('farms', 'id')))";

pub const NO_FARMS_TO_INSERT: &str = "No farms provided for insertion";
pub const NO_FARMS_TO_UPDATE: &str = "No farms provided for update";
pub const NO_PRODUCER_ID: &str = "No producer ID provided for deletion";
pub const FARM_WITHOUT_PRODUCER: &str = "Farm is not bound to a producer";
pub const NO_FARMS_FOR_PRODUCER: &str = "No farms found for the provided producer ID";
pub const DELETE_FAILED: &str = "Error deleting farms for producer";

/// [`FarmRepository`] over a [`Database`].
#[derive(Clone)]
pub struct FarmStore {
    db: Arc<dyn Database>,
}

impl FarmStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    async fn session(&self) -> StoreResult<Box<dyn Session>> {
        self.db
            .acquire()
            .await
            .map_err(|e| StoreError::from(e).normalize(UNMAPPED_TITLE))
    }

    /// Committed farms of one producer, normalized on failure.
    async fn reselect(&self, producer_id: ProducerId) -> StoreResult<Vec<Farm>> {
        self.find_by_producer(producer_id)
            .await
            .map_err(|e| e.normalize(UNMAPPED_TITLE))
    }
}

fn farm_params(farm: &Farm) -> [SqlParam; FARM_COLUMN_COUNT] {
    [
        SqlParam::Text(farm.name().as_str().to_string()),
        SqlParam::Text(farm.city().to_string()),
        SqlParam::Text(farm.state().as_str().to_string()),
        SqlParam::Float(farm.area().total()),
        SqlParam::Float(farm.area().arable()),
        SqlParam::Float(farm.area().vegetation()),
        farm.producer_id()
            .map_or(SqlParam::Null(SqlType::BigInt), |id| SqlParam::Int(id.get())),
    ]
}

/// The owner shared by a batch, rejected before any statement runs.
pub(crate) fn batch_owner(farms: &[Farm], empty_title: &str) -> StoreResult<ProducerId> {
    let first = farms
        .first()
        .ok_or_else(|| StoreError::InvalidParams(empty_title.to_string()))?;
    if farms.iter().any(|farm| farm.producer_id().is_none()) {
        return Err(StoreError::InvalidParams(FARM_WITHOUT_PRODUCER.to_string()));
    }
    first
        .producer_id()
        .ok_or_else(|| StoreError::InvalidParams(FARM_WITHOUT_PRODUCER.to_string()))
}

/// Ids from `RETURNING id`, which must cover every submitted farm.
fn returned_ids(rows: &[Row], expected: usize, title: &str) -> StoreResult<Vec<FarmId>> {
    if rows.len() != expected {
        return Err(StoreError::UnprocessableEntity(title.to_string()));
    }
    rows.iter()
        .map(|row| -> StoreResult<FarmId> { Ok(FarmId::new(row.i64("id")?)) })
        .collect()
}

/// One relationship row per (farm, crop) pair. Nothing is sent when no
/// farm has crops.
async fn insert_links(session: &mut dyn Session, ids: &[FarmId], farms: &[Farm]) -> StoreResult<()> {
    let params: Vec<SqlParam> = ids
        .iter()
        .zip(farms)
        .flat_map(|(id, farm)| {
            farm.crops()
                .iter()
                .flat_map(move |crop| [SqlParam::Int(id.get()), SqlParam::Int(crop.id.get())])
        })
        .collect();
    if params.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "INSERT INTO farms_crops_relationship (id_farm, id_crop) VALUES {}",
        values_list(params.len() / 2, 2)
    );
    session.query(&sql, &params).await?;
    Ok(())
}

async fn insert_farms(session: &mut dyn Session, farms: &[Farm]) -> StoreResult<Vec<FarmId>> {
    let sql = format!(
        "INSERT INTO farms ({FARM_COLUMNS}) VALUES {} RETURNING id",
        values_list(farms.len(), FARM_COLUMN_COUNT)
    );
    let params: Vec<SqlParam> = farms.iter().flat_map(farm_params).collect();
    let result = session.query(&sql, &params).await?;
    let ids = returned_ids(&result.rows, farms.len(), "Error inserting farms")?;
    insert_links(session, &ids, farms).await?;
    Ok(ids)
}

async fn upsert_farms(session: &mut dyn Session, farms: &[Farm]) -> StoreResult<Vec<FarmId>> {
    let sql = format!(
        "INSERT INTO farms (id, {FARM_COLUMNS}) VALUES {} \
         ON CONFLICT (id) DO UPDATE SET \
         name = EXCLUDED.name, \
         city = EXCLUDED.city, \
         state = EXCLUDED.state, \
         total_area_hectares = EXCLUDED.total_area_hectares, \
         arable_area_hectares = EXCLUDED.arable_area_hectares, \
         vegetation_area_hectares = EXCLUDED.vegetation_area_hectares \
         RETURNING id",
        values_list_with_first(farms.len(), FARM_COLUMN_COUNT + 1, ID_OR_NEXT)
    );
    let params: Vec<SqlParam> = farms
        .iter()
        .flat_map(|farm| {
            let id = farm
                .id()
                .map_or(SqlParam::Null(SqlType::BigInt), |id| SqlParam::Int(id.get()));
            std::iter::once(id).chain(farm_params(farm))
        })
        .collect();
    let result = session.query(&sql, &params).await?;
    let ids = returned_ids(&result.rows, farms.len(), "Error updating farms")?;

    let raw_ids: Vec<i64> = ids.iter().map(FarmId::get).collect();
    session
        .query(
            "DELETE FROM farms_crops_relationship WHERE id_farm = ANY($1)",
            &[SqlParam::IntArray(raw_ids)],
        )
        .await?;
    insert_links(session, &ids, farms).await?;
    Ok(ids)
}

async fn delete_farms(session: &mut dyn Session, producer_id: ProducerId) -> StoreResult<u64> {
    let param = [SqlParam::Int(producer_id.get())];
    session
        .query(
            "DELETE FROM farms_crops_relationship \
             WHERE id_farm IN (SELECT id FROM farms WHERE id_producer = $1)",
            &param,
        )
        .await?;
    let deleted = session
        .query("DELETE FROM farms WHERE id_producer = $1 RETURNING id", &param)
        .await?;
    if deleted.row_count == 0 {
        return Err(StoreError::UnprocessableEntity(NO_FARMS_FOR_PRODUCER.to_string()));
    }
    Ok(deleted.row_count)
}

#[async_trait]
impl FarmRepository for FarmStore {
    async fn save(&self, farm: &Farm) -> StoreResult<Farm> {
        debug!(name = %farm.name(), "saveFarm");
        let sql = format!(
            "INSERT INTO farms ({FARM_COLUMNS}) VALUES {} {RETURNING_FARM}",
            values_list(1, FARM_COLUMN_COUNT)
        );
        let mut session = self.db.acquire().await?;
        let result = session.query(&sql, &farm_params(farm)).await?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| StoreError::UnprocessableEntity("Error inserting farm".to_string()))?;
        farm_from_row(row.i64("id")?, row, None)
    }

    async fn save_many(&self, farms: &[Farm]) -> StoreResult<Vec<Farm>> {
        debug!(count = farms.len(), "saveManyFarms");
        let producer_id = batch_owner(farms, NO_FARMS_TO_INSERT)?;

        let mut session = self.session().await?;
        let outcome = match begin(session.as_mut()).await {
            Ok(()) => insert_farms(session.as_mut(), farms).await,
            Err(e) => Err(e),
        };
        let ids = settle(session.as_mut(), outcome, "saveMany", UNMAPPED_TITLE).await?;
        info!(producer_id = %producer_id, farms = ids.len(), "farms inserted");
        drop(session);

        self.reselect(producer_id).await
    }

    async fn update_many(&self, farms: &[Farm]) -> StoreResult<Vec<Farm>> {
        debug!(count = farms.len(), "updateManyFarms");
        let producer_id = batch_owner(farms, NO_FARMS_TO_UPDATE)?;

        let mut session = self.session().await?;
        let outcome = match begin(session.as_mut()).await {
            Ok(()) => upsert_farms(session.as_mut(), farms).await,
            Err(e) => Err(e),
        };
        let ids = settle(session.as_mut(), outcome, "updateMany", UNMAPPED_TITLE).await?;
        info!(producer_id = %producer_id, farms = ids.len(), "farms updated");
        drop(session);

        self.reselect(producer_id).await
    }

    async fn find_by_producer(&self, producer_id: ProducerId) -> StoreResult<Vec<Farm>> {
        debug!(producer_id = %producer_id, "findByProducerFarm");
        let sql = format!("{FARM_CROP_SELECT} WHERE f.id_producer = $1 ORDER BY f.id");
        let mut session = self.db.acquire().await?;
        let result = session
            .query(&sql, &[SqlParam::Int(producer_id.get())])
            .await?;
        group_by_farm(&result.rows)
    }

    async fn find_by_id(&self, id: FarmId) -> StoreResult<Option<Farm>> {
        debug!(farm_id = %id, "findByIdFarm");
        let sql = format!("{FARM_CROP_SELECT} WHERE f.id = $1 ORDER BY f.id");
        let mut session = self.db.acquire().await?;
        let result = session.query(&sql, &[SqlParam::Int(id.get())]).await?;
        Ok(group_by_farm(&result.rows)?.into_iter().next())
    }

    async fn delete_by_producer_id(&self, producer_id: Option<ProducerId>) -> StoreResult<()> {
        debug!(?producer_id, "deleteByProducerId");
        let producer_id =
            producer_id.ok_or_else(|| StoreError::InvalidParams(NO_PRODUCER_ID.to_string()))?;

        let mut session = self.session().await?;
        let outcome = match begin(session.as_mut()).await {
            Ok(()) => delete_farms(session.as_mut(), producer_id).await,
            Err(e) => Err(e),
        };
        let deleted =
            settle(session.as_mut(), outcome, "deleteByProducerId", DELETE_FAILED).await?;
        info!(producer_id = %producer_id, farms = deleted, "farms deleted");
        Ok(())
    }

    async fn dashboard(&self) -> StoreResult<Dashboard> {
        debug!("getDashboardFarm");
        let mut session = self.db.acquire().await?;
        let result = session.query(DASHBOARD_SQL, &[]).await?;
        dashboard_from_row(result.rows.first())
    }
}
