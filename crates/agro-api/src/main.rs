//! # agro-api: Binary Entry Point
//!
//! Parses configuration, installs tracing, connects Postgres (or falls back
//! to the in-memory registry) and serves the Axum application.

use agro_api::config::{AppConfig, LogFormat};
use agro_api::state::AppState;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    init_tracing(config.log_format);
    tracing::debug!(?config, "configuration loaded");

    let state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = agro_store::init_pool(url, &config.pool_settings())
                .await
                .map_err(|e| {
                    tracing::error!("Database initialization failed: {e}");
                    e
                })
                .context("connecting to Postgres")?;
            AppState::with_postgres(config.clone(), pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; serving from the in-memory registry");
            AppState::in_memory(config.clone())
        }
    };

    let app = agro_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("agro-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
