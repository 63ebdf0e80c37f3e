//! Registry-wide totals.

use std::sync::Arc;

use agro_store::{Dashboard, FarmRepository, StoreResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StateCountView {
    pub state: String,
    pub farm_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CropCountView {
    pub crop: String,
    pub farm_count: i64,
}

/// Response body of `GET /dashboard/totals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardView {
    pub total_farms: i64,
    pub total_farms_area_hectares: f64,
    pub farms_by_state: Vec<StateCountView>,
    pub farms_by_crop: Vec<CropCountView>,
    pub total_arable_area: f64,
    pub total_vegetation_area: f64,
}

impl From<Dashboard> for DashboardView {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            total_farms: dashboard.total_farms,
            total_farms_area_hectares: dashboard.total_farms_area_hectares,
            farms_by_state: dashboard
                .farms_by_state
                .into_iter()
                .map(|s| StateCountView {
                    state: s.state,
                    farm_count: s.farm_count,
                })
                .collect(),
            farms_by_crop: dashboard
                .farms_by_crop
                .into_iter()
                .map(|c| CropCountView {
                    crop: c.crop,
                    farm_count: c.farm_count,
                })
                .collect(),
            total_arable_area: dashboard.total_arable_area,
            total_vegetation_area: dashboard.total_vegetation_area,
        }
    }
}

pub struct GetDashboard {
    farms: Arc<dyn FarmRepository>,
}

impl GetDashboard {
    pub fn new(farms: Arc<dyn FarmRepository>) -> Self {
        Self { farms }
    }

    pub async fn execute(&self) -> StoreResult<DashboardView> {
        Ok(self.farms.dashboard().await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_store::testing::ScriptedDatabase;
    use agro_store::{FarmStore, MemoryRegistry, Row, SqlValue};

    #[tokio::test]
    async fn empty_registry_reports_zeroes() {
        let view = GetDashboard::new(Arc::new(MemoryRegistry::seeded()))
            .execute()
            .await
            .unwrap();
        assert_eq!(view.total_farms, 0);
        assert!(view.farms_by_state.is_empty());
        assert!(view.farms_by_crop.is_empty());
    }

    #[tokio::test]
    async fn runs_one_read_only_statement() {
        let db = ScriptedDatabase::new();
        db.push_rows(vec![Row::default()
            .with("total_farms", SqlValue::Int(2))
            .with("total_farms_area_hectares", SqlValue::Float(150.0))
            .with(
                "farms_by_state",
                SqlValue::Json(serde_json::json!([{"state": "GO", "farm_count": 2}])),
            )
            .with("farms_by_crop", SqlValue::Null)
            .with("total_arable_area", SqlValue::Float(100.0))
            .with("total_vegetation_area", SqlValue::Float(50.0))]);

        let view = GetDashboard::new(Arc::new(FarmStore::new(Arc::new(db.clone()))))
            .execute()
            .await
            .unwrap();
        assert_eq!(view.total_farms, 2);
        assert_eq!(view.farms_by_state[0].state, "GO");
        assert!(view.farms_by_crop.is_empty());

        let statements = db.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("WITH total_farms AS"));
    }
}
