//! Read-only reporting totals across all farms.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, StoreResult};
use crate::executor::Row;

/// Farm count for one state code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateCount {
    pub state: String,
    pub farm_count: i64,
}

/// Farm-link count for one crop name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCount {
    pub crop: String,
    pub farm_count: i64,
}

/// Registry-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_farms: i64,
    pub total_farms_area_hectares: f64,
    pub farms_by_state: Vec<StateCount>,
    pub farms_by_crop: Vec<CropCount>,
    pub total_arable_area: f64,
    pub total_vegetation_area: f64,
}

/// The dashboard in one statement. Both group lists are ordered by byte
/// value of their key, the same order as a `BTreeMap<&str, _>`.
pub const DASHBOARD_SQL: &str = r#"WITH total_farms AS (
    SELECT COUNT(*) AS total_farms_count FROM farms
),
total_area AS (
    SELECT SUM(total_area_hectares) AS total_area_hectares FROM farms
),
farms_by_state AS (
    SELECT state, COUNT(*) AS farm_count_by_state
    FROM farms
    GROUP BY state
),
farms_by_crop AS (
    SELECT c.name AS crop_name, COUNT(fc.id_crop) AS farm_count_by_crop
    FROM farms_crops_relationship fc
    JOIN crops c ON fc.id_crop = c.id
    GROUP BY c.name
),
land_usage AS (
    SELECT SUM(arable_area_hectares) AS total_arable_area,
           SUM(vegetation_area_hectares) AS total_vegetation_area
    FROM farms
)
SELECT
    (SELECT total_farms_count FROM total_farms) AS total_farms,
    (SELECT total_area_hectares FROM total_area) AS total_farms_area_hectares,
    (SELECT json_agg(json_build_object('state', state, 'farm_count', farm_count_by_state)
                     ORDER BY state COLLATE "C")
       FROM farms_by_state) AS farms_by_state,
    (SELECT json_agg(json_build_object('crop', crop_name, 'farm_count', farm_count_by_crop)
                     ORDER BY crop_name COLLATE "C")
       FROM farms_by_crop) AS farms_by_crop,
    (SELECT total_arable_area FROM land_usage) AS total_arable_area,
    (SELECT total_vegetation_area FROM land_usage) AS total_vegetation_area"#;

/// Decode the single dashboard row. Null aggregates (no farms yet) become
/// zero or an empty list.
pub(crate) fn dashboard_from_row(row: Option<&Row>) -> StoreResult<Dashboard> {
    let Some(row) = row else {
        return Ok(Dashboard::default());
    };
    Ok(Dashboard {
        total_farms: row.opt_i64("total_farms")?.unwrap_or(0),
        total_farms_area_hectares: row.opt_f64("total_farms_area_hectares")?.unwrap_or(0.0),
        farms_by_state: json_list(row, "farms_by_state")?,
        farms_by_crop: json_list(row, "farms_by_crop")?,
        total_arable_area: row.opt_f64("total_arable_area")?.unwrap_or(0.0),
        total_vegetation_area: row.opt_f64("total_vegetation_area")?.unwrap_or(0.0),
    })
}

fn json_list<T: serde::de::DeserializeOwned>(row: &Row, column: &str) -> StoreResult<Vec<T>> {
    match row.opt_json(column)? {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| DbError::decode(column, e.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SqlValue;
    use serde_json::json;

    #[test]
    fn decodes_full_row() {
        let row = Row::default()
            .with("total_farms", SqlValue::Int(3))
            .with("total_farms_area_hectares", SqlValue::Float(300.0))
            .with(
                "farms_by_state",
                SqlValue::Json(json!([{"state": "SP", "farm_count": 2}, {"state": "MG", "farm_count": 1}])),
            )
            .with(
                "farms_by_crop",
                SqlValue::Json(json!([{"crop": "Soja", "farm_count": 2}])),
            )
            .with("total_arable_area", SqlValue::Float(200.0))
            .with("total_vegetation_area", SqlValue::Float(100.0));

        let dashboard = dashboard_from_row(Some(&row)).unwrap();
        assert_eq!(dashboard.total_farms, 3);
        assert_eq!(dashboard.farms_by_state.len(), 2);
        assert_eq!(dashboard.farms_by_state[0].state, "SP");
        assert_eq!(dashboard.farms_by_crop[0].crop, "Soja");
        assert_eq!(dashboard.total_vegetation_area, 100.0);
    }

    #[test]
    fn group_lists_are_ordered_bytewise() {
        assert!(DASHBOARD_SQL.contains(r#"ORDER BY state COLLATE "C")"#));
        assert!(DASHBOARD_SQL.contains(r#"ORDER BY crop_name COLLATE "C")"#));
    }

    #[test]
    fn null_aggregates_become_zero() {
        let row = Row::default()
            .with("total_farms", SqlValue::Int(0))
            .with("total_farms_area_hectares", SqlValue::Null)
            .with("farms_by_state", SqlValue::Null)
            .with("farms_by_crop", SqlValue::Null)
            .with("total_arable_area", SqlValue::Null)
            .with("total_vegetation_area", SqlValue::Null);
        assert_eq!(dashboard_from_row(Some(&row)).unwrap(), Dashboard::default());
        assert_eq!(dashboard_from_row(None).unwrap(), Dashboard::default());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let row = Row::default()
            .with("total_farms", SqlValue::Int(1))
            .with("total_farms_area_hectares", SqlValue::Float(1.0))
            .with("farms_by_state", SqlValue::Json(json!({"state": "SP"})))
            .with("farms_by_crop", SqlValue::Null)
            .with("total_arable_area", SqlValue::Float(1.0))
            .with("total_vegetation_area", SqlValue::Float(0.0));
        assert!(dashboard_from_row(Some(&row)).is_err());
    }
}
