use std::sync::Arc;

use axum::{extract::State, Json};

use crate::services::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Read-only view of the upload counters.
pub async fn get_upload_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
