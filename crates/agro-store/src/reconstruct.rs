//! # Row → Aggregate Reconstruction
//!
//! The farm queries left-join farms to the relationship table to crops, so
//! a farm with `n` crops arrives as `n` rows and a farm with none arrives
//! once with null crop columns. [`group_by_farm`] folds that flat set back
//! into farms, each with its crop list.
//!
//! The fold is keyed by farm id in an insertion-ordered map:
//!
//! 1. The first row seen for an id builds the [`Farm`], with the row's crop
//!    if its `crop.id` is non-null.
//! 2. Later rows for the same id append their crop when `crop.id` is
//!    non-null and contribute nothing otherwise.
//! 3. Farms come out in first-seen order.

use agro_core::{Crop, CropId, Farm, FarmDraft, FarmId, ProducerId};
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::error::StoreResult;
use crate::executor::Row;

/// Joined farm + crop select. Append a `WHERE` clause and `ORDER BY f.id`.
pub const FARM_CROP_SELECT: &str = r#"SELECT f.id, f.name, f.city, f.state,
       f.total_area_hectares, f.arable_area_hectares, f.vegetation_area_hectares,
       f.id_producer, c.name AS "crop.name", c.id AS "crop.id"
FROM farms f
LEFT JOIN farms_crops_relationship fc ON f.id = fc.id_farm
LEFT JOIN crops c ON fc.id_crop = c.id"#;

/// Fold joined rows into farms, in the order farm ids first appear.
pub fn group_by_farm(rows: &[Row]) -> StoreResult<Vec<Farm>> {
    let mut farms: IndexMap<i64, Farm> = IndexMap::new();
    for row in rows {
        let id = row.i64("id")?;
        let crop = crop_from_row(row)?;
        match farms.entry(id) {
            Entry::Occupied(mut entry) => {
                if let Some(crop) = crop {
                    entry.get_mut().push_crop(crop);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(farm_from_row(id, row, crop)?);
            }
        }
    }
    Ok(farms.into_values().collect())
}

fn crop_from_row(row: &Row) -> StoreResult<Option<Crop>> {
    let Some(id) = row.opt_i64("crop.id")? else {
        return Ok(None);
    };
    let name = row.opt_str("crop.name")?.map(str::to_string);
    Ok(Some(Crop::new(CropId::new(id), name)))
}

pub(crate) fn farm_from_row(id: i64, row: &Row, first_crop: Option<Crop>) -> StoreResult<Farm> {
    let draft = FarmDraft {
        id: Some(FarmId::new(id)),
        producer_id: row.opt_i64("id_producer")?.map(ProducerId::new),
        name: row.str("name")?.to_string(),
        city: row.opt_str("city")?.unwrap_or_default().to_string(),
        state: row.str("state")?.to_string(),
        total_area_hectares: row.f64("total_area_hectares")?,
        arable_area_hectares: row.f64("arable_area_hectares")?,
        vegetation_area_hectares: row.f64("vegetation_area_hectares")?,
        crops: first_crop.into_iter().collect(),
    };
    Ok(Farm::new(draft)?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::executor::{Row, SqlValue};

    /// A joined row for farm `id` of producer 1 with an optional crop.
    pub fn farm_row(id: i64, crop: Option<(i64, &str)>) -> Row {
        let (crop_id, crop_name) = match crop {
            Some((cid, name)) => (SqlValue::Int(cid), SqlValue::Text(name.to_string())),
            None => (SqlValue::Null, SqlValue::Null),
        };
        Row::default()
            .with("id", SqlValue::Int(id))
            .with("name", SqlValue::Text(format!("Fazenda Numero {id}")))
            .with("city", SqlValue::Text("Sorriso".into()))
            .with("state", SqlValue::Text("MT".into()))
            .with("total_area_hectares", SqlValue::Float(100.0))
            .with("arable_area_hectares", SqlValue::Float(70.0))
            .with("vegetation_area_hectares", SqlValue::Float(30.0))
            .with("id_producer", SqlValue::Int(1))
            .with("crop.name", crop_name)
            .with("crop.id", crop_id)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::farm_row;
    use super::*;
    use crate::error::StoreError;
    use crate::executor::SqlValue;

    #[test]
    fn groups_crops_under_first_seen_farm() {
        let rows = vec![
            farm_row(1, Some((10, "Soja"))),
            farm_row(1, Some((11, "Milho"))),
            farm_row(2, None),
        ];
        let farms = group_by_farm(&rows).unwrap();
        assert_eq!(farms.len(), 2);

        assert_eq!(farms[0].id(), Some(FarmId::new(1)));
        let crops: Vec<_> = farms[0].crops().iter().map(|c| c.id.get()).collect();
        assert_eq!(crops, vec![10, 11]);
        assert_eq!(farms[0].crops()[1].name.as_deref(), Some("Milho"));

        assert_eq!(farms[1].id(), Some(FarmId::new(2)));
        assert!(farms[1].crops().is_empty());
    }

    #[test]
    fn preserves_first_seen_order() {
        let rows = vec![farm_row(5, None), farm_row(3, None), farm_row(5, Some((1, "Café")))];
        let farms = group_by_farm(&rows).unwrap();
        let ids: Vec<_> = farms.iter().filter_map(|f| f.id()).map(|id| id.get()).collect();
        assert_eq!(ids, vec![5, 3]);
        assert_eq!(farms[0].crops().len(), 1);
    }

    #[test]
    fn null_crop_after_first_row_adds_nothing() {
        let rows = vec![farm_row(1, Some((10, "Soja"))), farm_row(1, None)];
        let farms = group_by_farm(&rows).unwrap();
        assert_eq!(farms[0].crops().len(), 1);
    }

    #[test]
    fn empty_rows_yield_no_farms() {
        assert!(group_by_farm(&[]).unwrap().is_empty());
    }

    #[test]
    fn carries_owner_and_fields() {
        let farms = group_by_farm(&[farm_row(4, None)]).unwrap();
        let farm = &farms[0];
        assert_eq!(farm.producer_id(), Some(ProducerId::new(1)));
        assert_eq!(farm.city(), "Sorriso");
        assert_eq!(farm.state().as_str(), "MT");
        assert_eq!(farm.area().arable(), 70.0);
    }

    #[test]
    fn invalid_stored_row_surfaces_validation_error() {
        let row = Row::default()
            .with("id", SqlValue::Int(1))
            .with("name", SqlValue::Text("Fazenda Velha".into()))
            .with("city", SqlValue::Null)
            .with("state", SqlValue::Text("XX".into()))
            .with("total_area_hectares", SqlValue::Float(1.0))
            .with("arable_area_hectares", SqlValue::Float(1.0))
            .with("vegetation_area_hectares", SqlValue::Float(0.0))
            .with("id_producer", SqlValue::Int(1))
            .with("crop.name", SqlValue::Null)
            .with("crop.id", SqlValue::Null);
        assert!(matches!(
            group_by_farm(&[row]),
            Err(StoreError::Validation(_))
        ));
    }
}
