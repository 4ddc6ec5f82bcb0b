use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use imgdrop_core::{UploadError, UploadOutcome};
use imgdrop_storage::LocalStorage;
use serde::Serialize;

use crate::constants::{DEDUPLICATED_MESSAGE, SUCCESS_MESSAGE};
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::spool_multipart_file;

#[derive(Debug, Serialize)]
pub struct UploadData {
    #[serde(rename = "errFiles")]
    pub err_files: Vec<String>,
    #[serde(rename = "succMap")]
    pub succ_map: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub msg: String,
    pub code: u8,
    pub data: UploadData,
}

impl UploadResponse {
    pub fn from_outcome(original_name: &str, outcome: &UploadOutcome) -> Self {
        let msg = if outcome.deduplicated {
            DEDUPLICATED_MESSAGE
        } else {
            SUCCESS_MESSAGE
        };
        let mut succ_map = BTreeMap::new();
        if let Some(url) = &outcome.public_url {
            succ_map.insert(original_name.to_string(), url.clone());
        }
        Self {
            msg: msg.to_string(),
            code: outcome.error_code,
            data: UploadData {
                err_files: Vec::new(),
                succ_map,
            },
        }
    }
}

/// Upload image handler
///
/// Accepts one multipart file field (`file[]`, or `file`) and returns the public URL of
/// the stored, content-addressed object.
///
/// # Errors
/// - 400 with `{msg, code: 1}` when the upload is rejected
/// - 500 with `{msg, code: 1}` when hashing or persisting fails
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    let start = Instant::now();
    let settings = state.settings.snapshot();

    let spooled = match multipart {
        Ok(multipart) => spool_multipart_file(multipart, settings.limits.max_file_size).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Request is not a multipart upload");
            Err(UploadError::NoFileUploaded)
        }
    };
    let request = match spooled {
        Ok(request) => request,
        Err(e) => {
            state.ingestion.record_failure(start.elapsed(), 0);
            return Err(e.into());
        }
    };

    let storage = LocalStorage::new(&settings.storage_root);
    let file = state.ingestion.ingest(&settings, &storage, request).await?;

    let body = UploadResponse::from_outcome(&file.original_name, &file.outcome());
    let cache_control = HeaderValue::from_str(&format!(
        "public, max-age={}",
        settings.cache_max_age_secs
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600"));

    Ok(([(header::CACHE_CONTROL, cache_control)], Json(body)).into_response())
}
