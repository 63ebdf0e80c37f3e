//! Create (or converge on) a producer and register its farms.

use std::sync::Arc;

use agro_core::{CropRef, Farm, FarmDraft, Producer, ProducerId};
use agro_store::{CropRepository, FarmRepository, ProducerRepository, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::{resolve_crops, verify_crops, ProducerView};

/// One farm of a new producer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct FarmInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub total_area_hectares: f64,
    pub arable_area_hectares: f64,
    pub vegetation_area_hectares: f64,
    /// Catalogue crop ids, bare or as `{id, name}`.
    #[schema(value_type = Vec<String>)]
    pub crops: Vec<CropRef>,
}

impl FarmInput {
    fn to_farm(&self, owner: ProducerId) -> StoreResult<Farm> {
        Ok(Farm::new(FarmDraft {
            id: None,
            producer_id: Some(owner),
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            total_area_hectares: self.total_area_hectares,
            arable_area_hectares: self.arable_area_hectares,
            vegetation_area_hectares: self.vegetation_area_hectares,
            crops: resolve_crops(&self.crops),
        })?)
    }
}

/// Request body of `POST /producers`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProducerInput {
    pub name: String,
    pub document: String,
    pub farms: Vec<FarmInput>,
}

pub struct CreateProducer {
    producers: Arc<dyn ProducerRepository>,
    farms: Arc<dyn FarmRepository>,
    crops: Arc<dyn CropRepository>,
}

impl CreateProducer {
    pub fn new(
        producers: Arc<dyn ProducerRepository>,
        farms: Arc<dyn FarmRepository>,
        crops: Arc<dyn CropRepository>,
    ) -> Self {
        Self {
            producers,
            farms,
            crops,
        }
    }

    /// Upsert the producer by document, then insert its farms in one batch.
    ///
    /// The producer row is written before the farms are validated; a farm
    /// or crop failure leaves it in place.
    pub async fn execute(&self, input: CreateProducerInput) -> StoreResult<ProducerView> {
        let producer = Producer::new(None, input.name, input.document, None)?;
        let producer = self.producers.upsert(&producer).await?;
        let owner = producer.id().ok_or_else(|| {
            StoreError::UnprocessableEntity("Error inserting/updating producer".to_string())
        })?;

        let farms = input
            .farms
            .iter()
            .map(|farm| farm.to_farm(owner))
            .collect::<StoreResult<Vec<_>>>()?;

        let refs: Vec<&CropRef> = input.farms.iter().flat_map(|f| &f.crops).collect();
        verify_crops(self.crops.as_ref(), &refs).await?;

        let farms = self.farms.save_many(&farms).await?;
        info!(producer_id = %owner, farms = farms.len(), "producer created");
        Ok(ProducerView::new(&producer, &farms))
    }
}
