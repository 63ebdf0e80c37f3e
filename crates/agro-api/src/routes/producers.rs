//! # Producer Routes
//!
//! `POST /producers` upserts a producer by document and inserts its farms.
//! `PATCH /producers/{id}` updates only the supplied producer columns and
//! upserts the supplied farms. `DELETE /producers/{id}` removes the farms,
//! then the producer.

use agro_core::ProducerId;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{patch, post};
use axum::{Json, Router};

use crate::error::AppError;
use crate::extractors::{extract_json, parse_id};
use crate::state::AppState;
use crate::usecases::{CreateProducerInput, DeleteProducerOutput, ProducerView, UpdateProducerInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/producers", post(create_producer))
        .route(
            "/producers/{id}",
            patch(update_producer).delete(delete_producer),
        )
}

#[utoipa::path(
    post,
    path = "/producers",
    request_body = CreateProducerInput,
    responses(
        (status = 201, description = "Producer stored with its farms", body = ProducerView),
        (status = 400, description = "Invalid input or unknown crop id", body = crate::error::ErrorBody),
        (status = 422, description = "Write failed", body = crate::error::ErrorBody),
    ),
    tag = "producers"
)]
pub async fn create_producer(
    State(state): State<AppState>,
    body: Result<Json<CreateProducerInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProducerView>), AppError> {
    let input = extract_json(body)?;
    let view = state.create_producer().execute(input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    patch,
    path = "/producers/{id}",
    params(("id" = String, Path, description = "Producer ID")),
    request_body = UpdateProducerInput,
    responses(
        (status = 200, description = "Producer updated", body = ProducerView),
        (status = 400, description = "Invalid input, farm id or crop id", body = crate::error::ErrorBody),
        (status = 404, description = "Producer not found", body = crate::error::ErrorBody),
        (status = 422, description = "Write failed", body = crate::error::ErrorBody),
    ),
    tag = "producers"
)]
pub async fn update_producer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProducerInput>, JsonRejection>,
) -> Result<Json<ProducerView>, AppError> {
    let id: ProducerId = parse_id(&id)?;
    let input = extract_json(body)?;
    let view = state.update_producer().execute(id, input).await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/producers/{id}",
    params(("id" = String, Path, description = "Producer ID")),
    responses(
        (status = 200, description = "Producer removed", body = DeleteProducerOutput),
        (status = 400, description = "Invalid id", body = crate::error::ErrorBody),
        (status = 404, description = "Producer not found", body = crate::error::ErrorBody),
        (status = 422, description = "Producer has no farms or delete failed", body = crate::error::ErrorBody),
    ),
    tag = "producers"
)]
pub async fn delete_producer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteProducerOutput>, AppError> {
    let id: ProducerId = parse_id(&id)?;
    let output = state.delete_producer().execute(id).await?;
    Ok(Json(output))
}
