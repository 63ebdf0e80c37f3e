//! Crops are catalogue rows referenced by farms; this crate never creates them.

use serde::{Deserialize, Serialize};

use crate::id::{CropId, ParseIdError};

/// A crop reference with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crop {
    pub id: CropId,
    #[serde(default)]
    pub name: Option<String>,
}

impl Crop {
    pub fn new(id: CropId, name: Option<String>) -> Self {
        Self { id, name }
    }
}

/// A crop as it arrives from a caller: a bare id or an `{id, name}` pair.
///
/// Ids are kept as text until resolution so that unknown or malformed ids
/// can be reported back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CropRef {
    Id(String),
    Named {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl CropRef {
    /// The referenced id, as supplied.
    pub fn raw_id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Named { id, .. } => id,
        }
    }

    /// Normalize to a [`Crop`].
    pub fn resolve(&self) -> Result<Crop, ParseIdError> {
        let id = self.raw_id().parse::<CropId>()?;
        let name = match self {
            Self::Id(_) => None,
            Self::Named { name, .. } => name.clone(),
        };
        Ok(Crop::new(id, name))
    }
}

impl From<&Crop> for CropRef {
    fn from(crop: &Crop) -> Self {
        Self::Named {
            id: crop.id.to_string(),
            name: crop.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_and_pair_normalize_to_same_crop_id() {
        let bare: CropRef = serde_json::from_str("\"5\"").unwrap();
        let pair: CropRef = serde_json::from_str(r#"{"id":"5","name":"Soja"}"#).unwrap();
        assert_eq!(bare.resolve().unwrap().id, pair.resolve().unwrap().id);
        assert_eq!(bare.resolve().unwrap().name, None);
        assert_eq!(pair.resolve().unwrap().name.as_deref(), Some("Soja"));
    }

    #[test]
    fn malformed_id_is_reported_verbatim() {
        let crop = CropRef::Id("invalid-crop-id".into());
        assert_eq!(crop.raw_id(), "invalid-crop-id");
        assert!(crop.resolve().is_err());
    }

    #[test]
    fn crop_round_trips_through_ref() {
        let crop = Crop::new(CropId::new(3), Some("Milho".into()));
        assert_eq!(CropRef::from(&crop).resolve().unwrap(), crop);
    }
}
