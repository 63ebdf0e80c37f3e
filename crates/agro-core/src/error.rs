//! # Error Types
//!
//! Value-object validation failures and the stable error code table shared
//! by every layer of the registry.
//!
//! Each code carries a machine-readable identifier, a human title and the
//! HTTP status the outer surface reports for it. Stores and orchestration
//! raise their own enums but always resolve to one of these codes.

use thiserror::Error;

/// Stable error codes, one per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Caller supplied insufficient or contradictory input.
    InvalidParams,
    /// No matching row for a required lookup.
    NotFound,
    /// A write produced no usable result, or an unclassified failure occurred.
    UnprocessableEntity,
    /// Taxpayer document failed both checksum algorithms.
    InvalidDocument,
    /// Farm sub-areas do not sum to the total area.
    InvalidArea,
    /// State code is not one of the 27 federative units.
    InvalidState,
    /// Name is empty or lacks a second token.
    InvalidName,
}

impl ErrorCode {
    /// Machine-readable code, e.g. `"INVALID_PARAMS"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidParams => "INVALID_PARAMS",
            Self::NotFound => "NOT_FOUND",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::InvalidDocument => "INVALID_DOCUMENT",
            Self::InvalidArea => "INVALID_AREA",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidName => "INVALID_NAME",
        }
    }

    /// Human-readable title for the code.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidParams => "Invalid Params",
            Self::NotFound => "Not Found",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::InvalidDocument => "Invalid Document",
            Self::InvalidArea => "Invalid Area",
            Self::InvalidState => "Invalid State",
            Self::InvalidName => "Invalid Name",
        }
    }

    /// HTTP status reported for this code.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UnprocessableEntity => 422,
            Self::InvalidParams
            | Self::InvalidDocument
            | Self::InvalidArea
            | Self::InvalidState
            | Self::InvalidName => 400,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction-time validation failure of a value object.
///
/// These are never caught by the stores; they propagate to whatever
/// constructed the entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Neither the 11-digit nor the 14-digit checksum validates.
    #[error("Invalid Document: {0}")]
    InvalidDocument(String),

    /// `arable + vegetation != total` at 4 decimal places, or total is zero.
    #[error("Invalid totals: total {total}, arable {arable}, vegetation {vegetation}")]
    InvalidArea {
        /// Declared total area.
        total: f64,
        /// Declared arable area.
        arable: f64,
        /// Declared vegetation area.
        vegetation: f64,
    },

    /// Code is not one of the fixed state codes.
    #[error("Invalid state: The name must contain in list of brazilian states ({0:?})")]
    InvalidState(String),

    /// Name is empty or has fewer than two tokens.
    #[error("Invalid name: The name must contain first and last name ({0:?})")]
    InvalidName(String),
}

impl ValidationError {
    /// Error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidDocument(_) => ErrorCode::InvalidDocument,
            Self::InvalidArea { .. } => ErrorCode::InvalidArea,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::InvalidName(_) => ErrorCode::InvalidName,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_statuses() {
        assert_eq!(ErrorCode::InvalidParams.status(), 400);
        assert_eq!(ErrorCode::NotFound.status(), 404);
        assert_eq!(ErrorCode::UnprocessableEntity.status(), 422);
        assert_eq!(ErrorCode::InvalidDocument.status(), 400);
        assert_eq!(ErrorCode::InvalidArea.status(), 400);
    }

    #[test]
    fn code_display_matches_as_str() {
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(
            format!("{}", ErrorCode::UnprocessableEntity),
            "UNPROCESSABLE_ENTITY"
        );
    }

    #[test]
    fn validation_errors_carry_their_code() {
        assert_eq!(
            ValidationError::InvalidDocument("x".into()).code(),
            ErrorCode::InvalidDocument
        );
        assert_eq!(
            ValidationError::InvalidState("XX".into()).code(),
            ErrorCode::InvalidState
        );
        assert_eq!(
            ValidationError::InvalidName("John".into()).code(),
            ErrorCode::InvalidName
        );
        let area = ValidationError::InvalidArea {
            total: 10.0,
            arable: 5.0,
            vegetation: 4.0,
        };
        assert_eq!(area.code(), ErrorCode::InvalidArea);
        assert!(area.to_string().contains("Invalid totals"));
    }
}
