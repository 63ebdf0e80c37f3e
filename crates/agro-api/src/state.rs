//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. It is also the composition root: repositories are
//! chosen once here and handed to each use case through its constructor.

use std::sync::Arc;

use agro_store::{
    CropRepository, CropStore, Database, FarmRepository, FarmStore, MemoryRegistry, PgDatabase,
    ProducerRepository, ProducerStore,
};
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::usecases::{CreateProducer, DeleteProducer, GetDashboard, UpdateProducer};

/// Shared application state accessible to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub producers: Arc<dyn ProducerRepository>,
    pub farms: Arc<dyn FarmRepository>,
    pub crops: Arc<dyn CropRepository>,

    /// Postgres pool, probed by the readiness check. `None` in in-memory
    /// mode.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("postgres", &self.db_pool.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// In-memory mode over a freshly seeded registry.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::with_registry(config, MemoryRegistry::seeded())
    }

    /// In-memory mode over a given registry.
    pub fn with_registry(config: AppConfig, registry: MemoryRegistry) -> Self {
        let shared = Arc::new(registry);
        Self {
            producers: shared.clone(),
            farms: shared.clone(),
            crops: shared,
            db_pool: None,
            config,
        }
    }

    /// Postgres-backed stores sharing one pool.
    pub fn with_postgres(config: AppConfig, pool: PgPool) -> Self {
        let db: Arc<dyn Database> =
            Arc::new(PgDatabase::new(pool.clone(), config.statement_timeout()));
        Self {
            producers: Arc::new(ProducerStore::new(db.clone())),
            farms: Arc::new(FarmStore::new(db.clone())),
            crops: Arc::new(CropStore::new(db)),
            db_pool: Some(pool),
            config,
        }
    }

    pub fn create_producer(&self) -> CreateProducer {
        CreateProducer::new(self.producers.clone(), self.farms.clone(), self.crops.clone())
    }

    pub fn update_producer(&self) -> UpdateProducer {
        UpdateProducer::new(self.producers.clone(), self.farms.clone(), self.crops.clone())
    }

    pub fn delete_producer(&self) -> DeleteProducer {
        DeleteProducer::new(self.producers.clone(), self.farms.clone())
    }

    pub fn get_dashboard(&self) -> GetDashboard {
        GetDashboard::new(self.farms.clone())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(AppConfig::default())
    }
}
