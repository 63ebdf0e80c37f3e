//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document, served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agro Registry API",
        version = "0.1.0",
        description = "Producers, their farms and farm crops, with registry-wide totals.\n\nTaxpayer documents are checksum-validated (11 or 14 digits), farm areas must add up, and state codes come from a fixed list of 27.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server"),
    ),
    paths(
        crate::routes::producers::create_producer,
        crate::routes::producers::update_producer,
        crate::routes::producers::delete_producer,
        crate::routes::dashboard::get_totals,
    ),
    components(schemas(
        crate::usecases::CreateProducerInput,
        crate::usecases::FarmInput,
        crate::usecases::UpdateProducerInput,
        crate::usecases::FarmPatchInput,
        crate::usecases::ProducerView,
        crate::usecases::FarmView,
        crate::usecases::CropView,
        crate::usecases::DeleteProducerOutput,
        crate::usecases::DashboardView,
        crate::usecases::StateCountView,
        crate::usecases::CropCountView,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "producers", description = "Producer and farm registration"),
        (name = "dashboard", description = "Registry totals"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
