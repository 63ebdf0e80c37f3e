//! Remove a producer together with its farms.

use std::sync::Arc;

use agro_core::ProducerId;
use agro_store::{FarmRepository, ProducerRepository, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

/// Response body of `DELETE /producers/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteProducerOutput {
    pub data: String,
}

pub struct DeleteProducer {
    producers: Arc<dyn ProducerRepository>,
    farms: Arc<dyn FarmRepository>,
}

impl DeleteProducer {
    pub fn new(producers: Arc<dyn ProducerRepository>, farms: Arc<dyn FarmRepository>) -> Self {
        Self { producers, farms }
    }

    /// The farm delete is one transaction and the producer delete another.
    /// A producer without farms cannot be removed.
    pub async fn execute(&self, id: ProducerId) -> StoreResult<DeleteProducerOutput> {
        self.producers.find_by_id(id).await?;
        self.farms.delete_by_producer_id(Some(id)).await?;
        self.producers.delete_by_id(id).await?;
        info!(producer_id = %id, "producer removed");
        Ok(DeleteProducerOutput {
            data: format!("Id {id} removed with success"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::{Crop, CropId, Farm, FarmDraft, Producer};
    use agro_store::{MemoryRegistry, StoreError};

    async fn registry_with_producer(with_farm: bool) -> (MemoryRegistry, ProducerId) {
        let registry = MemoryRegistry::seeded();
        let producer = Producer::new(None, "John Doe", "123.456.789-09", None).unwrap();
        let id = registry.upsert(&producer).await.unwrap().id().unwrap();
        if with_farm {
            let farm = Farm::new(FarmDraft {
                id: None,
                producer_id: Some(id),
                name: "Fazenda Um".into(),
                city: "Sorriso".into(),
                state: "MT".into(),
                total_area_hectares: 10.0,
                arable_area_hectares: 5.0,
                vegetation_area_hectares: 5.0,
                crops: vec![Crop::new(CropId::new(1), None)],
            })
            .unwrap();
            registry.save_many(&[farm]).await.unwrap();
        }
        (registry, id)
    }

    fn use_case(registry: &MemoryRegistry) -> DeleteProducer {
        let shared = Arc::new(registry.clone());
        DeleteProducer::new(shared.clone(), shared)
    }

    #[tokio::test]
    async fn removes_farms_links_and_producer() {
        let (registry, id) = registry_with_producer(true).await;
        let output = use_case(&registry).execute(id).await.unwrap();
        assert_eq!(output.data, format!("Id {id} removed with success"));
        assert_eq!(registry.farm_count(), 0);
        assert_eq!(registry.link_count(), 0);
        assert!(matches!(
            ProducerRepository::find_by_id(&registry, id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_producer_is_not_found() {
        let registry = MemoryRegistry::seeded();
        let err = use_case(&registry)
            .execute(ProducerId::new(4))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref t) if t == "No producers found."));
    }

    #[tokio::test]
    async fn producer_without_farms_is_kept() {
        let (registry, id) = registry_with_producer(false).await;
        let err = use_case(&registry).execute(id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnprocessableEntity(ref t) if t == "No farms found for the provided producer ID"
        ));
        assert!(ProducerRepository::find_by_id(&registry, id).await.is_ok());
    }
}
