//! # Farms
//!
//! A farm belongs to one producer, sits in one state, declares its three
//! land areas and references any number of catalogue crops.

use crate::area::HectaresArea;
use crate::crop::Crop;
use crate::error::ValidationError;
use crate::id::{FarmId, ProducerId};
use crate::name::PersonName;
use crate::state_code::StateCode;

/// Unvalidated farm fields, as collected from a caller or a stored row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmDraft {
    pub id: Option<FarmId>,
    pub producer_id: Option<ProducerId>,
    pub name: String,
    pub city: String,
    pub state: String,
    pub total_area_hectares: f64,
    pub arable_area_hectares: f64,
    pub vegetation_area_hectares: f64,
    pub crops: Vec<Crop>,
}

/// A validated farm.
#[derive(Debug, Clone, PartialEq)]
pub struct Farm {
    id: Option<FarmId>,
    producer_id: Option<ProducerId>,
    name: PersonName,
    city: String,
    state: StateCode,
    area: HectaresArea,
    crops: Vec<Crop>,
}

impl Farm {
    /// Validate a draft. Areas are checked first, then the name, then the
    /// state code; the first failure is returned.
    pub fn new(draft: FarmDraft) -> Result<Self, ValidationError> {
        let area = HectaresArea::new(
            draft.total_area_hectares,
            draft.arable_area_hectares,
            draft.vegetation_area_hectares,
        )?;
        let name = PersonName::new(draft.name)?;
        let state = StateCode::new(draft.state)?;
        Ok(Self {
            id: draft.id,
            producer_id: draft.producer_id,
            name,
            city: draft.city,
            state,
            area,
            crops: draft.crops,
        })
    }

    pub fn id(&self) -> Option<FarmId> {
        self.id
    }

    pub fn producer_id(&self) -> Option<ProducerId> {
        self.producer_id
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &StateCode {
        &self.state
    }

    pub fn area(&self) -> &HectaresArea {
        &self.area
    }

    pub fn crops(&self) -> &[Crop] {
        &self.crops
    }

    /// Rebind the farm to an owning producer.
    pub fn with_producer(mut self, producer_id: ProducerId) -> Self {
        self.producer_id = Some(producer_id);
        self
    }

    pub fn push_crop(&mut self, crop: Crop) {
        self.crops.push(crop);
    }

    /// Back to plain fields, e.g. to overlay a partial update.
    pub fn to_draft(&self) -> FarmDraft {
        FarmDraft {
            id: self.id,
            producer_id: self.producer_id,
            name: self.name.as_str().to_string(),
            city: self.city.clone(),
            state: self.state.as_str().to_string(),
            total_area_hectares: self.area.total(),
            arable_area_hectares: self.area.arable(),
            vegetation_area_hectares: self.area.vegetation(),
            crops: self.crops.clone(),
        }
    }
}
