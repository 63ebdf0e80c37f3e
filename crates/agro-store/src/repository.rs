//! # Repository Traits
//!
//! The capability sets orchestration depends on. The Postgres-backed
//! stores implement them; use-case tests substitute in-memory fakes.

use agro_core::{Crop, CropId, Farm, FarmId, Producer, ProducerId};
use async_trait::async_trait;

use crate::dashboard::Dashboard;
use crate::error::StoreResult;

/// A scalar or set match on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion<T> {
    One(T),
    Any(Vec<T>),
}

/// Crop lookup criteria. At least one side must be present; both sides
/// must match when both are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropCriteria {
    pub id: Option<Criterion<CropId>>,
    pub name: Option<Criterion<String>>,
}

impl CropCriteria {
    pub fn ids(ids: Vec<CropId>) -> Self {
        Self {
            id: Some(Criterion::Any(ids)),
            name: None,
        }
    }

    pub fn names(names: Vec<String>) -> Self {
        Self {
            id: None,
            name: Some(Criterion::Any(names)),
        }
    }
}

/// Columns to change on a producer. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProducerPatch {
    pub name: Option<String>,
    pub document: Option<String>,
    pub is_active: Option<bool>,
}

impl From<&Producer> for ProducerPatch {
    fn from(producer: &Producer) -> Self {
        Self {
            name: Some(producer.name().as_str().to_string()),
            document: Some(producer.document().as_str().to_string()),
            is_active: Some(producer.is_active()),
        }
    }
}

#[async_trait]
pub trait CropRepository: Send + Sync {
    async fn find(&self, criteria: &CropCriteria) -> StoreResult<Vec<Crop>>;
}

#[async_trait]
pub trait FarmRepository: Send + Sync {
    async fn save(&self, farm: &Farm) -> StoreResult<Farm>;
    async fn save_many(&self, farms: &[Farm]) -> StoreResult<Vec<Farm>>;
    async fn update_many(&self, farms: &[Farm]) -> StoreResult<Vec<Farm>>;
    async fn find_by_producer(&self, producer_id: ProducerId) -> StoreResult<Vec<Farm>>;
    async fn find_by_id(&self, id: FarmId) -> StoreResult<Option<Farm>>;
    async fn delete_by_producer_id(&self, producer_id: Option<ProducerId>) -> StoreResult<()>;
    async fn dashboard(&self) -> StoreResult<Dashboard>;
}

#[async_trait]
pub trait ProducerRepository: Send + Sync {
    async fn save(&self, producer: &Producer) -> StoreResult<Producer>;
    async fn upsert(&self, producer: &Producer) -> StoreResult<Producer>;
    async fn update(&self, id: ProducerId, patch: &ProducerPatch) -> StoreResult<Producer>;
    async fn find_by_id(&self, id: ProducerId) -> StoreResult<Producer>;
    async fn delete_by_id(&self, id: ProducerId) -> StoreResult<()>;
}
