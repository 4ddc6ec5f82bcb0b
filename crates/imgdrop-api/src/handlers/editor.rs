use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use imgdrop_core::EditorOptions;
use serde::Serialize;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MediaEpochResponse {
    pub epoch: String,
}

/// Merged editor option set for `name`.
pub async fn get_editor_config(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<EditorOptions>, HttpAppError> {
    let options = state.editor_configs.get(&name).await?;
    Ok(Json(options))
}

/// Current cache-busting token for static assets.
pub async fn get_media_epoch(State(state): State<Arc<AppState>>) -> Json<MediaEpochResponse> {
    Json(MediaEpochResponse {
        epoch: state.media_epoch.current().await,
    })
}
