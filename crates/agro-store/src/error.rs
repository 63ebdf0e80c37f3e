//! # Store Errors
//!
//! Two layers. [`DbError`] is whatever the executor reports: driver
//! failures, statement timeouts, rows that do not decode. It carries no
//! domain meaning. [`StoreError`] is the typed taxonomy the stores expose;
//! after a rolled-back transaction every failure is passed through
//! [`StoreError::normalize`], which keeps typed errors and folds
//! executor errors into `UnprocessableEntity`.

use std::time::Duration;

use agro_core::{ErrorCode, ValidationError};
use thiserror::Error;

/// Title used when an executor failure has no more specific mapping.
pub const UNMAPPED_TITLE: &str = "No Mapped Error";

/// Executor-level failure.
#[derive(Error, Debug)]
pub enum DbError {
    /// Error reported by the Postgres driver or pool.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Embedded migrations failed to apply.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A statement did not complete within the configured limit.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// A result column was missing or held an unexpected value.
    #[error("cannot decode column {column:?}: {reason}")]
    Decode {
        /// Column label.
        column: String,
        /// What went wrong.
        reason: String,
    },

    /// A result column has a Postgres type the executor does not map.
    #[error("unsupported type {type_name} for column {column:?}")]
    UnsupportedType {
        /// Column label.
        column: String,
        /// Postgres type name.
        type_name: String,
    },

    /// Any other executor failure.
    #[error("{0}")]
    Other(String),
}

impl DbError {
    pub(crate) fn decode(column: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Typed store failure.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Caller supplied insufficient or contradictory input.
    #[error("{0}")]
    InvalidParams(String),

    /// A required lookup matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// A write produced no usable result, or an unmapped failure occurred.
    #[error("{0}")]
    UnprocessableEntity(String),

    /// A stored row did not validate as a domain value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unclassified executor failure. Never escapes a transactional block.
    #[error(transparent)]
    Database(#[from] DbError),
}

impl StoreError {
    /// Stable code. Executor failures report `UNPROCESSABLE_ENTITY`.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::UnprocessableEntity(_) | Self::Database(_) => ErrorCode::UnprocessableEntity,
            Self::Validation(e) => e.code(),
        }
    }

    /// Human title. Store errors carry their own; validation errors use
    /// the code's title.
    pub fn title(&self) -> String {
        match self {
            Self::InvalidParams(title)
            | Self::NotFound(title)
            | Self::UnprocessableEntity(title) => title.clone(),
            Self::Validation(e) => e.code().title().to_string(),
            Self::Database(_) => UNMAPPED_TITLE.to_string(),
        }
    }

    /// HTTP status for the code.
    pub fn status(&self) -> u16 {
        self.code().status()
    }

    /// Whether this is already one of the typed domain errors.
    pub fn is_typed(&self) -> bool {
        !matches!(self, Self::Database(_))
    }

    /// Keep typed errors, turn executor failures into
    /// `UnprocessableEntity(title)`.
    pub fn normalize(self, title: &str) -> Self {
        match self {
            Self::Database(_) => Self::UnprocessableEntity(title.to_string()),
            typed => typed,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
