//! # agro-api: Producer Registry HTTP Surface
//!
//! Axum application over the orchestration use cases.
//!
//! ## Routes
//!
//! | Method | Path                | Use case        |
//! |--------|---------------------|-----------------|
//! | POST   | `/producers`        | CreateProducer  |
//! | PATCH  | `/producers/{id}`   | UpdateProducer  |
//! | DELETE | `/producers/{id}`   | DeleteProducer  |
//! | GET    | `/dashboard/totals` | GetDashboard    |
//!
//! Health probes live under `/health/*` and the OpenAPI document at
//! `/openapi.json`.
//!
//! ## Modes
//!
//! With a Postgres pool the repositories are the `agro-store` SQL stores.
//! Without one they are a single seeded [`agro_store::MemoryRegistry`].

pub mod config;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod usecases;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::producers::router())
        .merge(routes::dashboard::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Returns 200 "ready", or 503 when a configured database
/// cannot answer `SELECT 1`.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
