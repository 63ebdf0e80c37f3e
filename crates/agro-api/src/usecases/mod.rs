//! # Orchestration Use Cases
//!
//! Each use case receives its repositories at construction and sequences
//! calls across them. None of them opens a transaction of its own; the
//! farm store makes each batch atomic, and a failure after an earlier step
//! leaves that step in place.
//!
//! Crop references are checked against the catalogue before any farm
//! batch reaches the store, so an unknown crop id never opens a
//! transaction.

pub mod create_producer;
pub mod delete_producer;
pub mod get_dashboard;
pub mod update_producer;

pub use create_producer::{CreateProducer, CreateProducerInput, FarmInput};
pub use delete_producer::{DeleteProducer, DeleteProducerOutput};
pub use get_dashboard::{CropCountView, DashboardView, GetDashboard, StateCountView};
pub use update_producer::{FarmPatchInput, UpdateProducer, UpdateProducerInput};

use agro_core::{Crop, CropId, CropRef, Farm, Producer};
use agro_store::{CropCriteria, CropRepository, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A crop as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CropView {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A farm as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FarmView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub city: String,
    pub state: String,
    pub total_area_hectares: f64,
    pub arable_area_hectares: f64,
    pub vegetation_area_hectares: f64,
    pub crops: Vec<CropView>,
}

impl From<&Farm> for FarmView {
    fn from(farm: &Farm) -> Self {
        Self {
            id: farm.id().map(|id| id.get()),
            name: farm.name().to_string(),
            city: farm.city().to_string(),
            state: farm.state().to_string(),
            total_area_hectares: farm.area().total(),
            arable_area_hectares: farm.area().arable(),
            vegetation_area_hectares: farm.area().vegetation(),
            crops: farm
                .crops()
                .iter()
                .map(|crop| CropView {
                    id: crop.id.get(),
                    name: crop.name.clone(),
                })
                .collect(),
        }
    }
}

/// A producer with its farms, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProducerView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub document: String,
    pub farms: Vec<FarmView>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl ProducerView {
    pub fn new(producer: &Producer, farms: &[Farm]) -> Self {
        Self {
            id: producer.id().map(|id| id.get()),
            name: producer.name().to_string(),
            document: producer.document().to_string(),
            farms: farms.iter().map(FarmView::from).collect(),
            is_active: producer.is_active(),
        }
    }
}

/// Reject crop references the catalogue does not hold.
///
/// The error names every offending id, as supplied and in input order.
/// A lookup that finds nothing counts as "none exist".
pub(crate) async fn verify_crops(
    catalogue: &dyn CropRepository,
    refs: &[&CropRef],
) -> StoreResult<()> {
    if refs.is_empty() {
        return Ok(());
    }
    let requested: Vec<CropId> = refs
        .iter()
        .filter_map(|crop| crop.resolve().ok())
        .map(|crop| crop.id)
        .collect();

    let known: Vec<CropId> = if requested.is_empty() {
        Vec::new()
    } else {
        match catalogue.find(&CropCriteria::ids(requested)).await {
            Ok(found) => found.into_iter().map(|crop| crop.id).collect(),
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        }
    };

    let invalid: Vec<&str> = refs
        .iter()
        .filter(|crop| crop.resolve().map_or(true, |c| !known.contains(&c.id)))
        .map(|crop| crop.raw_id())
        .collect();
    if !invalid.is_empty() {
        return Err(StoreError::InvalidParams(format!(
            "Invalid crop_id: {}",
            invalid.join(", ")
        )));
    }
    Ok(())
}

/// Crops for a farm whose references parse. Malformed ones are caught by
/// [`verify_crops`].
pub(crate) fn resolve_crops(refs: &[CropRef]) -> Vec<Crop> {
    refs.iter().filter_map(|crop| crop.resolve().ok()).collect()
}
