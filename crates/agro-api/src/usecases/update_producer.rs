//! Partially update a producer and upsert its farms.

use std::sync::Arc;

use agro_core::{CropRef, Farm, FarmDraft, FarmId, Producer, ProducerId};
use agro_store::{
    CropRepository, FarmRepository, ProducerPatch, ProducerRepository, StoreError, StoreResult,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::{resolve_crops, verify_crops, ProducerView};

/// Changes to one farm. With an `id` the fields overlay the stored farm;
/// without one the farm is new and every field is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct FarmPatchInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub total_area_hectares: Option<f64>,
    pub arable_area_hectares: Option<f64>,
    pub vegetation_area_hectares: Option<f64>,
    #[schema(value_type = Option<Vec<String>>)]
    pub crops: Option<Vec<CropRef>>,
}

impl FarmPatchInput {
    /// Overlay onto `base`; supplied fields win.
    fn overlay(&self, base: FarmDraft) -> FarmDraft {
        FarmDraft {
            id: base.id,
            producer_id: base.producer_id,
            name: self.name.clone().unwrap_or(base.name),
            city: self.city.clone().unwrap_or(base.city),
            state: self.state.clone().unwrap_or(base.state),
            total_area_hectares: self.total_area_hectares.unwrap_or(base.total_area_hectares),
            arable_area_hectares: self.arable_area_hectares.unwrap_or(base.arable_area_hectares),
            vegetation_area_hectares: self
                .vegetation_area_hectares
                .unwrap_or(base.vegetation_area_hectares),
            crops: match &self.crops {
                Some(refs) => resolve_crops(refs),
                None => base.crops,
            },
        }
    }
}

/// Request body of `PATCH /producers/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProducerInput {
    pub name: Option<String>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
    pub farms: Option<Vec<FarmPatchInput>>,
}

pub struct UpdateProducer {
    producers: Arc<dyn ProducerRepository>,
    farms: Arc<dyn FarmRepository>,
    crops: Arc<dyn CropRepository>,
}

impl UpdateProducer {
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

    pub async fn execute(
        &self,
        id: ProducerId,
        input: UpdateProducerInput,
    ) -> StoreResult<ProducerView> {
        let stored = self.producers.find_by_id(id).await?;
        // The merged producer must validate before anything is written.
        Producer::new(
            Some(id),
            input
                .name
                .clone()
                .unwrap_or_else(|| stored.name().to_string()),
            stored.document().as_str(),
            Some(input.is_active.unwrap_or(stored.is_active())),
        )?;
        let patch = ProducerPatch {
            name: input.name.clone(),
            document: None,
            is_active: input.is_active,
        };
        let updated = self.producers.update(id, &patch).await?;

        let current = self.farms.find_by_producer(id).await?;
        let Some(patches) = input.farms else {
            return Ok(ProducerView::new(&updated, &current));
        };

        let farms = merge_farms(id, &current, &patches)?;
        let refs: Vec<&CropRef> = patches
            .iter()
            .filter_map(|farm| farm.crops.as_ref())
            .flatten()
            .collect();
        verify_crops(self.crops.as_ref(), &refs).await?;

        let farms = self.farms.update_many(&farms).await?;
        info!(producer_id = %id, farms = farms.len(), "producer updated");
        Ok(ProducerView::new(&updated, &farms))
    }
}

/// Overlay each patch on the owned farm it names. Ids the producer does
/// not own are rejected together, in input order.
fn merge_farms(
    owner: ProducerId,
    current: &[Farm],
    patches: &[FarmPatchInput],
) -> StoreResult<Vec<Farm>> {
    let mut unknown = Vec::new();
    let mut drafts = Vec::with_capacity(patches.len());
    for patch in patches {
        let base = match &patch.id {
            None => FarmDraft::default(),
            Some(raw) => {
                let owned = raw
                    .parse::<FarmId>()
                    .ok()
                    .and_then(|id| current.iter().find(|farm| farm.id() == Some(id)));
                match owned {
                    Some(farm) => farm.to_draft(),
                    None => {
                        unknown.push(raw.as_str());
                        continue;
                    }
                }
            }
        };
        drafts.push(FarmDraft {
            producer_id: Some(owner),
            ..patch.overlay(base)
        });
    }
    if !unknown.is_empty() {
        return Err(StoreError::InvalidParams(format!(
            "Invalid farm_id: {}",
            unknown.join(", ")
        )));
    }
    drafts
        .into_iter()
        .map(|draft| -> StoreResult<Farm> { Ok(Farm::new(draft)?) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::create_producer::{CreateProducer, CreateProducerInput, FarmInput};
    use agro_core::ErrorCode;
    use agro_store::MemoryRegistry;

    struct Fixture {
        registry: MemoryRegistry,
        producer: ProducerId,
    }

    async fn fixture() -> Fixture {
        let registry = MemoryRegistry::seeded();
        let shared = Arc::new(registry.clone());
        let view = CreateProducer::new(shared.clone(), shared.clone(), shared)
            .execute(CreateProducerInput {
                name: "John Doe".into(),
                document: "123.456.789-09".into(),
                farms: vec![FarmInput {
                    name: "Fazenda Um".into(),
                    city: "Sorriso".into(),
                    state: "MT".into(),
                    total_area_hectares: 100.0,
                    arable_area_hectares: 70.0,
                    vegetation_area_hectares: 30.0,
                    crops: vec![CropRef::Id("1".into()), CropRef::Id("2".into())],
                }],
            })
            .await
            .unwrap();
        Fixture {
            registry,
            producer: ProducerId::new(view.id.unwrap()),
        }
    }

    fn use_case(registry: &MemoryRegistry) -> UpdateProducer {
        let shared = Arc::new(registry.clone());
        UpdateProducer::new(shared.clone(), shared.clone(), shared)
    }

    #[tokio::test]
    async fn updates_only_supplied_columns() {
        let fx = fixture().await;
        let view = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    is_active: Some(false),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.name, "John Doe");
        assert!(!view.is_active);
        // Farms untouched when omitted.
        assert_eq!(view.farms.len(), 1);
        assert_eq!(view.farms[0].crops.len(), 2);
    }

    #[tokio::test]
    async fn merges_patch_over_stored_farm_and_replaces_crops() {
        let fx = fixture().await;
        let view = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    farms: Some(vec![FarmPatchInput {
                        id: Some("1".into()),
                        city: Some("Lucas do Rio Verde".into()),
                        crops: Some(vec![CropRef::Id("3".into())]),
                        ..FarmPatchInput::default()
                    }]),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap();
        let farm = &view.farms[0];
        assert_eq!(farm.name, "Fazenda Um");
        assert_eq!(farm.city, "Lucas do Rio Verde");
        assert_eq!(farm.total_area_hectares, 100.0);
        assert_eq!(farm.crops.len(), 1);
        assert_eq!(farm.crops[0].name.as_deref(), Some("Algodão"));
        assert_eq!(fx.registry.link_count(), 1);
    }

    #[tokio::test]
    async fn farm_without_id_is_added() {
        let fx = fixture().await;
        let view = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    farms: Some(vec![FarmPatchInput {
                        name: Some("Fazenda Nova".into()),
                        city: Some("Rio Verde".into()),
                        state: Some("GO".into()),
                        total_area_hectares: Some(50.0),
                        arable_area_hectares: Some(25.0),
                        vegetation_area_hectares: Some(25.0),
                        crops: Some(vec![]),
                        ..FarmPatchInput::default()
                    }]),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.farms.len(), 2);
        assert_eq!(view.farms[1].name, "Fazenda Nova");
    }

    #[tokio::test]
    async fn foreign_farm_ids_are_rejected() {
        let fx = fixture().await;
        let err = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    farms: Some(vec![
                        FarmPatchInput {
                            id: Some("77".into()),
                            ..FarmPatchInput::default()
                        },
                        FarmPatchInput {
                            id: Some("abc".into()),
                            ..FarmPatchInput::default()
                        },
                    ]),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParams(ref t) if t == "Invalid farm_id: 77, abc"));
    }

    #[tokio::test]
    async fn unknown_crop_keeps_stored_links() {
        let fx = fixture().await;
        let err = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    farms: Some(vec![FarmPatchInput {
                        id: Some("1".into()),
                        crops: Some(vec![CropRef::Id("50".into())]),
                        ..FarmPatchInput::default()
                    }]),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParams(ref t) if t == "Invalid crop_id: 50"));
        assert_eq!(fx.registry.link_count(), 2);
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_update() {
        let fx = fixture().await;
        let err = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    name: Some("Solo".into()),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidName);
    }

    #[tokio::test]
    async fn unknown_producer_is_not_found() {
        let registry = MemoryRegistry::seeded();
        let err = use_case(&registry)
            .execute(ProducerId::new(9), UpdateProducerInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_farm_list_is_rejected_by_the_store() {
        let fx = fixture().await;
        let err = use_case(&fx.registry)
            .execute(
                fx.producer,
                UpdateProducerInput {
                    farms: Some(vec![]),
                    ..UpdateProducerInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParams(ref t) if t == "No farms provided for update"));
    }
}
