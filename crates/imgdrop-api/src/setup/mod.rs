//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use imgdrop_core::Config;
use std::sync::Arc;

/// Build the shared state for `config` and warm what can be warmed.
pub async fn initialize_state(config: &Config) -> Result<Arc<AppState>> {
    config.validate().context("Configuration validation failed")?;

    let state = Arc::new(AppState::new(config));

    if let Err(e) = state.editor_configs.warm().await {
        tracing::warn!(error = %e, "Editor option sets are invalid; only requests for them will fail");
    }

    Ok(state)
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let state = initialize_state(&config).await?;
    tracing::info!("Configuration loaded and validated successfully");

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
