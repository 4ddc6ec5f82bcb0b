//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use imgdrop_storage::{LocalStorage, Storage};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the storage root exists or can be created.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.settings.snapshot();
    let storage = LocalStorage::new(&settings.storage_root);

    let mut response = serde_json::json!({
        "status": "ready",
        "storage": "unknown"
    });

    let ready = match tokio::time::timeout(TIMEOUT, storage.ensure_root()).await {
        Ok(Ok(())) => {
            response["storage"] = serde_json::json!("ready");
            true
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Storage readiness check failed");
            response["storage"] = serde_json::json!(format!("not_ready: {}", e));
            false
        }
        Err(_) => {
            tracing::error!("Storage readiness check timed out");
            response["storage"] = serde_json::json!("timeout");
            false
        }
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        response["status"] = serde_json::json!("not_ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
