//! # agro-store: Transactional Persistence
//!
//! Stores for producers, farms and the crop catalogue, written against a
//! small query-executor boundary ([`Database`] / [`Session`]) so the same
//! code runs over Postgres in production and over a scripted executor in
//! tests.
//!
//! ## Transactions
//!
//! Multi-statement writes (`save_many`, `update_many`,
//! `delete_by_producer_id`) acquire one session, send `BEGIN`, run their
//! statements and `COMMIT`. Any failure sends `ROLLBACK` before the error
//! is returned. Typed errors are returned unchanged; executor errors become
//! `UnprocessableEntity`. Nothing is retried.
//!
//! [`MemoryRegistry`] implements the same repository traits in process
//! memory, for running without a database and for use-case tests.
//!
//! ## Reconstruction
//!
//! Farm reads return one row per (farm, crop) pair. [`group_by_farm`] folds
//! them back into farms with their crop lists, in first-seen order.

pub mod crops;
pub mod dashboard;
pub mod error;
pub mod executor;
pub mod farms;
pub mod memory;
pub mod postgres;
pub mod producers;
pub mod reconstruct;
pub mod repository;
pub mod sql;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
mod transaction;

pub use crops::CropStore;
pub use dashboard::{CropCount, Dashboard, StateCount};
pub use error::{DbError, StoreError, StoreResult};
pub use executor::{
    Database, QueryResult, Row, Session, SqlParam, SqlType, SqlValue, TransactionControl,
    TransactionState,
};
pub use farms::FarmStore;
pub use memory::MemoryRegistry;
pub use postgres::{init_pool, PgDatabase, PoolSettings};
pub use producers::ProducerStore;
pub use reconstruct::group_by_farm;
pub use repository::{
    CropCriteria, CropRepository, Criterion, FarmRepository, ProducerPatch, ProducerRepository,
};
