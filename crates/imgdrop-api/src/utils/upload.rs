//! Multipart upload extraction
//!
//! The file field is read exactly once, chunk by chunk, into an anonymous spool file.
//! Spooling stops one byte past the size limit so oversized uploads are still
//! recognized without buffering the rest of the body.

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use imgdrop_core::UploadError;
use imgdrop_processing::UploadRequest;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};

use crate::constants::{SPOOL_BUFFER_SIZE, UPLOAD_FIELD_NAMES};

/// Upload request backed by a spool file.
pub type SpooledUpload = UploadRequest<File>;

fn multipart_error(err: MultipartError, max_size: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(error = %err, "Upload body exceeds limit");
        UploadError::file_too_large(max_size + 1, max_size)
    } else {
        tracing::warn!(error = %err, "Failed to read multipart body");
        UploadError::NoFileUploaded
    }
}

async fn create_spool() -> Result<File, UploadError> {
    let file = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(|e| UploadError::UnexpectedIo(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
    Ok(File::from_std(file))
}

/// Spool the first file field named `file[]` or `file`.
///
/// Returns `Ok(None)` when the form carries no such field. Other fields are skipped.
pub async fn spool_multipart_file(
    mut multipart: Multipart,
    max_size: u64,
) -> Result<Option<SpooledUpload>, UploadError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        let field_name = field.name().unwrap_or_default();
        if !UPLOAD_FIELD_NAMES.contains(&field_name) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);

        let cap = max_size.saturating_add(1);
        let mut writer = BufWriter::with_capacity(SPOOL_BUFFER_SIZE, create_spool().await?);
        let mut size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_size))?
        {
            let remaining = cap - size;
            if remaining == 0 {
                break;
            }
            let take = (chunk.len() as u64).min(remaining) as usize;
            writer.write_all(&chunk[..take]).await?;
            size += take as u64;
        }

        writer.flush().await?;
        let mut file = writer.into_inner();
        file.seek(SeekFrom::Start(0)).await?;

        tracing::debug!(
            filename = %file_name,
            content_type = ?content_type,
            size_bytes = size,
            "Spooled upload"
        );

        return Ok(Some(UploadRequest::new(file_name, content_type, size, file)));
    }

    Ok(None)
}
