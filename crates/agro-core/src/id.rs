//! # Identity Newtypes
//!
//! Store-assigned identifiers. Each identifier is a distinct type, so a
//! [`FarmId`] cannot be passed where a [`CropId`] is expected.
//!
//! Ids are positive 64-bit integers assigned by `BIGSERIAL` columns. An
//! entity that has not been persisted yet carries `None` instead of an id.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0:?}")]
pub struct ParseIdError(pub String);

macro_rules! define_id {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $ty(i64);

        impl $ty {
            /// Wrap a raw store identifier.
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Access the raw identifier.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $ty {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(ParseIdError(s.to_string())),
                }
            }
        }
    };
}

define_id!(
    /// Identifier of a producer row.
    ProducerId
);
define_id!(
    /// Identifier of a farm row.
    FarmId
);
define_id!(
    /// Identifier of a crop row.
    CropId
);
