//! # Dashboard Routes

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppError;
use crate::state::AppState;
use crate::usecases::DashboardView;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/totals", get(get_totals))
}

#[utoipa::path(
    get,
    path = "/dashboard/totals",
    responses(
        (status = 200, description = "Totals across all farms", body = DashboardView),
        (status = 422, description = "Query failed", body = crate::error::ErrorBody),
    ),
    tag = "dashboard"
)]
pub async fn get_totals(State(state): State<AppState>) -> Result<Json<DashboardView>, AppError> {
    Ok(Json(state.get_dashboard().execute().await?))
}
