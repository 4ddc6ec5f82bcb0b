//! Upload ingestion pipeline
//!
//! Drives one upload through validation, hashing and persistence:
//!
//! `Received -> Validating -> {Rejected | Hashing} -> {Deduplicated | Persisting} -> {Persisted | PersistFailed}`
//!
//! Validation runs entirely before the storage directory is touched.

use imgdrop_core::{ErrorMetadata, UploadError, UploadOutcome, UploadSettings};
use imgdrop_processing::{UploadRequest, UploadValidator};
use imgdrop_storage::{digest_stream, sanitize_filename, split_name, Storage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncSeek};

use super::metrics::{UploadMetrics, UploadResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Validating,
    Hashing,
    Persisting,
}

/// A successfully ingested upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub original_name: String,
    pub stored_filename: String,
    pub public_url: String,
    pub deduplicated: bool,
    pub size_bytes: u64,
}

impl IngestedFile {
    pub fn outcome(&self) -> UploadOutcome {
        UploadOutcome::stored(self.public_url.clone(), self.deduplicated)
    }
}

#[derive(Clone)]
pub struct IngestionService {
    metrics: Arc<UploadMetrics>,
}

impl IngestionService {
    pub fn new(metrics: Arc<UploadMetrics>) -> Self {
        Self { metrics }
    }

    /// Count an upload that failed before it reached the pipeline.
    pub fn record_failure(&self, elapsed: Duration, bytes: u64) {
        self.metrics.record(UploadResult::Failed, elapsed, bytes);
    }

    /// Run one upload through the pipeline and record its outcome in the metrics.
    ///
    /// `request` is `None` when the transport carried no file.
    pub async fn ingest<R>(
        &self,
        settings: &UploadSettings,
        storage: &dyn Storage,
        request: Option<UploadRequest<R>>,
    ) -> Result<IngestedFile, UploadError>
    where
        R: AsyncRead + AsyncSeek + Send + Unpin,
    {
        let start = Instant::now();
        let size = request.as_ref().map(|r| r.size).unwrap_or(0);

        let result = self.run(settings, storage, request).await;

        let elapsed = start.elapsed();
        match &result {
            Ok(file) => {
                self.metrics
                    .record(UploadResult::Successful, elapsed, size);
                tracing::info!(
                    original_name = %file.original_name,
                    stored_filename = %file.stored_filename,
                    deduplicated = file.deduplicated,
                    size_bytes = size,
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "Upload ingested"
                );
            }
            Err(e) => {
                self.metrics.record(UploadResult::Failed, elapsed, size);
                tracing::debug!(
                    error_code = e.error_code(),
                    client_error = e.kind().is_client_error(),
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "Upload not ingested"
                );
            }
        }

        result
    }

    async fn run<R>(
        &self,
        settings: &UploadSettings,
        storage: &dyn Storage,
        request: Option<UploadRequest<R>>,
    ) -> Result<IngestedFile, UploadError>
    where
        R: AsyncRead + AsyncSeek + Send + Unpin,
    {
        tracing::debug!(stage = ?Stage::Received, has_file = request.is_some(), "Upload stage");
        let mut request = request.ok_or(UploadError::NoFileUploaded)?;

        tracing::debug!(stage = ?Stage::Validating, filename = %request.original_name, "Upload stage");
        UploadValidator::new(&settings.limits)
            .validate(&mut request)
            .await?;

        tracing::debug!(stage = ?Stage::Hashing, "Upload stage");
        let (digest, hashed_bytes) = digest_stream(&mut request.stream)
            .await
            .map_err(UploadError::HashingFailed)?;

        let sanitized = sanitize_filename(&request.original_name);
        let (stem, sanitized_extension) = split_name(&sanitized);
        // Sanitizing can strip everything before the dot; keep the validated extension.
        let validated_extension = request.extension();
        let extension = if sanitized_extension.is_empty() {
            validated_extension.as_str()
        } else {
            sanitized_extension
        };

        tracing::debug!(
            stage = ?Stage::Persisting,
            digest = %digest,
            size_bytes = hashed_bytes,
            "Upload stage"
        );
        let stored = storage
            .store(&digest, stem, extension, &mut request.stream)
            .await?;

        Ok(IngestedFile {
            public_url: settings.public_url(&stored.stored_filename),
            original_name: request.original_name,
            stored_filename: stored.stored_filename,
            deduplicated: stored.deduplicated,
            size_bytes: if stored.deduplicated {
                hashed_bytes
            } else {
                stored.size_bytes
            },
        })
    }
}
