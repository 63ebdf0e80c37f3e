//! # In-Memory Registry
//!
//! One value implementing all three repository traits over process memory.
//! The API runs on it when no database is configured, and use-case tests
//! use it as their fake.
//!
//! Errors follow the Postgres stores: the same typed titles, and a
//! [`DbError`] wherever Postgres would reject a row (unknown foreign key,
//! duplicate document). Every mutation validates first and then applies its
//! changes under one write lock, so a failed batch leaves nothing behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use agro_core::{Crop, CropId, Farm, FarmDraft, FarmId, Producer, ProducerId};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::crops::{NO_CRITERIA, NO_CROPS_FOUND};
use crate::dashboard::{CropCount, Dashboard, StateCount};
use crate::error::{DbError, StoreError, StoreResult, UNMAPPED_TITLE};
use crate::farms::{
    batch_owner, NO_FARMS_FOR_PRODUCER, NO_FARMS_TO_INSERT, NO_FARMS_TO_UPDATE, NO_PRODUCER_ID,
};
use crate::producers::NO_PRODUCERS_FOUND;
use crate::repository::{
    CropCriteria, CropRepository, Criterion, FarmRepository, ProducerPatch, ProducerRepository,
};

/// Catalogue loaded by [`MemoryRegistry::seeded`], in id order.
pub const SEED_CROPS: [&str; 5] = ["Soja", "Milho", "Algodão", "Café", "Cana de Açúcar"];

#[derive(Debug, Default)]
struct Tables {
    producers: BTreeMap<i64, Producer>,
    farms: BTreeMap<i64, Farm>,
    crops: BTreeMap<i64, Crop>,
    links: Vec<(i64, i64)>,
    next_producer: i64,
    next_farm: i64,
    next_crop: i64,
}

impl Tables {
    fn allocate_farm_id(&mut self, requested: Option<FarmId>) -> i64 {
        match requested {
            Some(id) => {
                self.next_farm = self.next_farm.max(id.get());
                id.get()
            }
            None => {
                self.next_farm += 1;
                self.next_farm
            }
        }
    }

    /// Rejects what the foreign keys would: a missing owner or crop.
    fn check_references(&self, farms: &[Farm]) -> StoreResult<()> {
        for farm in farms {
            let owner = farm.producer_id().map(|id| id.get()).unwrap_or_default();
            if !self.producers.contains_key(&owner) {
                return Err(foreign_key("farms_id_producer_fkey"));
            }
            if farm.crops().iter().any(|c| !self.crops.contains_key(&c.id.get())) {
                return Err(foreign_key("farms_crops_relationship_id_crop_fkey"));
            }
        }
        Ok(())
    }

    /// Stores `farm` under `id` without its crops, and links the crops.
    fn put_farm(&mut self, id: i64, farm: &Farm) -> StoreResult<()> {
        let mut draft = farm.to_draft();
        draft.id = Some(FarmId::new(id));
        draft.crops = Vec::new();
        self.farms.insert(id, Farm::new(draft)?);
        self.links
            .extend(farm.crops().iter().map(|crop| (id, crop.id.get())));
        Ok(())
    }

    /// A stored farm with its linked crops, named from the catalogue.
    fn joined(&self, id: i64, farm: &Farm) -> Farm {
        let mut farm = farm.clone();
        for (_, crop_id) in self.links.iter().filter(|(farm_id, _)| *farm_id == id) {
            if let Some(crop) = self.crops.get(crop_id) {
                farm.push_crop(crop.clone());
            }
        }
        farm
    }

    fn farms_of(&self, producer_id: ProducerId) -> Vec<Farm> {
        self.farms
            .iter()
            .filter(|(_, farm)| farm.producer_id() == Some(producer_id))
            .map(|(id, farm)| self.joined(*id, farm))
            .collect()
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::Database(DbError::Other(format!(
        "insert or update violates foreign key constraint \"{constraint}\""
    )))
}

fn matches<T: PartialEq>(criterion: &Option<Criterion<T>>, value: &T) -> bool {
    match criterion {
        None => true,
        Some(Criterion::One(expected)) => expected == value,
        Some(Criterion::Any(expected)) => expected.contains(value),
    }
}

/// Producers, farms and crops held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRegistry {
    /// An empty registry with no crop catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose catalogue holds [`SEED_CROPS`] with ids 1 to 5.
    pub fn seeded() -> Self {
        let registry = Self::new();
        for name in SEED_CROPS {
            registry.add_crop(name);
        }
        registry
    }

    /// Add a catalogue crop, or return the existing one with that name.
    pub fn add_crop(&self, name: &str) -> Crop {
        let mut tables = self.tables.write();
        if let Some(existing) = tables
            .crops
            .values()
            .find(|crop| crop.name.as_deref() == Some(name))
        {
            return existing.clone();
        }
        tables.next_crop += 1;
        let id = tables.next_crop;
        let crop = Crop::new(CropId::new(id), Some(name.to_string()));
        tables.crops.insert(id, crop.clone());
        crop
    }

    /// Number of farm↔crop links currently stored.
    pub fn link_count(&self) -> usize {
        self.tables.read().links.len()
    }

    /// Number of farm rows currently stored.
    pub fn farm_count(&self) -> usize {
        self.tables.read().farms.len()
    }
}

#[async_trait]
impl CropRepository for MemoryRegistry {
    async fn find(&self, criteria: &CropCriteria) -> StoreResult<Vec<Crop>> {
        debug!(?criteria, "findCrops");
        if criteria.id.is_none() && criteria.name.is_none() {
            return Err(StoreError::InvalidParams(NO_CRITERIA.to_string()));
        }
        let tables = self.tables.read();
        let found: Vec<Crop> = tables
            .crops
            .values()
            .filter(|crop| matches(&criteria.id, &crop.id))
            .filter(|crop| match &crop.name {
                Some(name) => matches(&criteria.name, name),
                None => criteria.name.is_none(),
            })
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(StoreError::NotFound(NO_CROPS_FOUND.to_string()));
        }
        Ok(found)
    }
}

#[async_trait]
impl FarmRepository for MemoryRegistry {
    async fn save(&self, farm: &Farm) -> StoreResult<Farm> {
        debug!(name = %farm.name(), "saveFarm");
        let mut tables = self.tables.write();
        let unlinked = Farm::new(FarmDraft {
            crops: Vec::new(),
            ..farm.to_draft()
        })?;
        tables.check_references(std::slice::from_ref(&unlinked))?;
        let id = tables.allocate_farm_id(None);
        tables.put_farm(id, &unlinked)?;
        tables
            .farms
            .get(&id)
            .map(|stored| tables.joined(id, stored))
            .ok_or_else(|| StoreError::UnprocessableEntity("Error inserting farm".to_string()))
    }

    async fn save_many(&self, farms: &[Farm]) -> StoreResult<Vec<Farm>> {
        debug!(count = farms.len(), "saveManyFarms");
        let producer_id = batch_owner(farms, NO_FARMS_TO_INSERT)?;
        let mut tables = self.tables.write();
        tables
            .check_references(farms)
            .map_err(|e| e.normalize(UNMAPPED_TITLE))?;
        for farm in farms {
            let id = tables.allocate_farm_id(None);
            tables.put_farm(id, farm)?;
        }
        info!(producer_id = %producer_id, farms = farms.len(), "farms inserted");
        Ok(tables.farms_of(producer_id))
    }

    async fn update_many(&self, farms: &[Farm]) -> StoreResult<Vec<Farm>> {
        debug!(count = farms.len(), "updateManyFarms");
        let producer_id = batch_owner(farms, NO_FARMS_TO_UPDATE)?;
        let mut tables = self.tables.write();
        tables
            .check_references(farms)
            .map_err(|e| e.normalize(UNMAPPED_TITLE))?;
        for farm in farms {
            let id = tables.allocate_farm_id(farm.id());
            // An existing row keeps its owner.
            let owner = tables
                .farms
                .get(&id)
                .and_then(Farm::producer_id)
                .or(farm.producer_id());
            tables.links.retain(|(farm_id, _)| *farm_id != id);
            let mut draft = farm.to_draft();
            draft.producer_id = owner;
            tables.put_farm(id, &Farm::new(draft)?)?;
        }
        info!(producer_id = %producer_id, farms = farms.len(), "farms updated");
        Ok(tables.farms_of(producer_id))
    }

    async fn find_by_producer(&self, producer_id: ProducerId) -> StoreResult<Vec<Farm>> {
        debug!(producer_id = %producer_id, "findByProducerFarm");
        Ok(self.tables.read().farms_of(producer_id))
    }

    async fn find_by_id(&self, id: FarmId) -> StoreResult<Option<Farm>> {
        debug!(farm_id = %id, "findByIdFarm");
        let tables = self.tables.read();
        Ok(tables
            .farms
            .get(&id.get())
            .map(|farm| tables.joined(id.get(), farm)))
    }

    async fn delete_by_producer_id(&self, producer_id: Option<ProducerId>) -> StoreResult<()> {
        debug!(?producer_id, "deleteByProducerId");
        let producer_id =
            producer_id.ok_or_else(|| StoreError::InvalidParams(NO_PRODUCER_ID.to_string()))?;
        let mut tables = self.tables.write();
        let owned: Vec<i64> = tables
            .farms
            .iter()
            .filter(|(_, farm)| farm.producer_id() == Some(producer_id))
            .map(|(id, _)| *id)
            .collect();
        if owned.is_empty() {
            return Err(StoreError::UnprocessableEntity(NO_FARMS_FOR_PRODUCER.to_string()));
        }
        tables.links.retain(|(farm_id, _)| !owned.contains(farm_id));
        tables.farms.retain(|id, _| !owned.contains(id));
        info!(producer_id = %producer_id, farms = owned.len(), "farms deleted");
        Ok(())
    }

    async fn dashboard(&self) -> StoreResult<Dashboard> {
        debug!("getDashboardFarm");
        let tables = self.tables.read();
        let mut by_state: BTreeMap<&str, i64> = BTreeMap::new();
        let mut dashboard = Dashboard::default();
        for farm in tables.farms.values() {
            dashboard.total_farms += 1;
            dashboard.total_farms_area_hectares += farm.area().total();
            dashboard.total_arable_area += farm.area().arable();
            dashboard.total_vegetation_area += farm.area().vegetation();
            *by_state.entry(farm.state().as_str()).or_default() += 1;
        }
        let mut by_crop: BTreeMap<&str, i64> = BTreeMap::new();
        for (_, crop_id) in &tables.links {
            if let Some(name) = tables.crops.get(crop_id).and_then(|c| c.name.as_deref()) {
                *by_crop.entry(name).or_default() += 1;
            }
        }
        dashboard.farms_by_state = by_state
            .into_iter()
            .map(|(state, farm_count)| StateCount {
                state: state.to_string(),
                farm_count,
            })
            .collect();
        dashboard.farms_by_crop = by_crop
            .into_iter()
            .map(|(crop, farm_count)| CropCount {
                crop: crop.to_string(),
                farm_count,
            })
            .collect();
        Ok(dashboard)
    }
}

#[async_trait]
impl ProducerRepository for MemoryRegistry {
    async fn save(&self, producer: &Producer) -> StoreResult<Producer> {
        debug!(document = %producer.document(), "saveProducer");
        let mut tables = self.tables.write();
        if tables
            .producers
            .values()
            .any(|p| p.document() == producer.document())
        {
            return Err(StoreError::Database(DbError::Other(
                "duplicate key value violates unique constraint \"producers_document_key\"".into(),
            )));
        }
        tables.next_producer += 1;
        let id = ProducerId::new(tables.next_producer);
        let saved = Producer::new(
            Some(id),
            producer.name().as_str(),
            producer.document().as_str(),
            Some(producer.is_active()),
        )?;
        tables.producers.insert(id.get(), saved.clone());
        Ok(saved)
    }

    async fn upsert(&self, producer: &Producer) -> StoreResult<Producer> {
        debug!(document = %producer.document(), "upsertProducer");
        let mut tables = self.tables.write();
        let existing = tables
            .producers
            .values()
            .find(|p| p.document() == producer.document())
            .and_then(Producer::id);
        let id = match existing {
            Some(id) => id,
            None => {
                tables.next_producer += 1;
                ProducerId::new(tables.next_producer)
            }
        };
        let saved = Producer::new(
            Some(id),
            producer.name().as_str(),
            producer.document().as_str(),
            Some(producer.is_active()),
        )?;
        tables.producers.insert(id.get(), saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: ProducerId, patch: &ProducerPatch) -> StoreResult<Producer> {
        debug!(producer_id = %id, ?patch, "updateProducer");
        let mut tables = self.tables.write();
        let current = tables
            .producers
            .get(&id.get())
            .ok_or_else(|| StoreError::UnprocessableEntity("Error updating producer".to_string()))?;
        let updated = Producer::new(
            Some(id),
            patch.name.as_deref().unwrap_or(current.name().as_str()),
            patch.document.as_deref().unwrap_or(current.document().as_str()),
            Some(patch.is_active.unwrap_or(current.is_active())),
        )?;
        if tables
            .producers
            .values()
            .any(|p| p.id() != Some(id) && p.document() == updated.document())
        {
            return Err(StoreError::Database(DbError::Other(
                "duplicate key value violates unique constraint \"producers_document_key\"".into(),
            )));
        }
        tables.producers.insert(id.get(), updated.clone());
        Ok(updated)
    }

    async fn find_by_id(&self, id: ProducerId) -> StoreResult<Producer> {
        debug!(producer_id = %id, "findProducer");
        self.tables
            .read()
            .producers
            .get(&id.get())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(NO_PRODUCERS_FOUND.to_string()))
    }

    async fn delete_by_id(&self, id: ProducerId) -> StoreResult<()> {
        debug!(producer_id = %id, "deleteByIdProducer");
        let mut tables = self.tables.write();
        if tables
            .farms
            .values()
            .any(|farm| farm.producer_id() == Some(id))
        {
            return Err(foreign_key("farms_id_producer_fkey"));
        }
        tables.producers.remove(&id.get());
        Ok(())
    }
}
