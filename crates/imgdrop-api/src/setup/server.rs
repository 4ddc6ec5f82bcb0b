//! Server startup and graceful shutdown

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use imgdrop_core::Config;
use std::sync::Arc;

/// Start the server with graceful shutdown
pub async fn start_server(config: &Config, state: Arc<AppState>, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let settings = state.settings.snapshot();
    tracing::info!(
        max_file_size_bytes = config.max_file_size_bytes(),
        min_file_size_bytes = settings.limits.min_file_size,
        extensions = %settings.limits.allowed_extensions.iter().cloned().collect::<Vec<_>>().join(","),
        storage_root = %settings.storage_root.display(),
        public_url_prefix = %settings.public_url_prefix,
        environment = %config.environment(),
        "Server ready and accepting connections"
    );

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(state));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Re-read upload settings and editor option sets on every SIGHUP.
#[cfg(unix)]
async fn reload_on_hangup(state: Arc<AppState>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGHUP handler; settings reload disabled");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        tracing::info!("Received hangup signal");
        match state.reload().await {
            Ok(()) => tracing::info!("Configuration reloaded"),
            Err(e) => tracing::error!(error = %e, "Settings reload failed; keeping previous settings"),
        }
    }
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM. If a handler cannot be installed that
/// branch never completes and the other one still applies.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
