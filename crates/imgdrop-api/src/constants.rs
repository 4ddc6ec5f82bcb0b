//! API constants
//!
//! Route paths, multipart field names and the fixed response messages.

/// Image upload endpoint
pub const UPLOAD_IMAGES_PATH: &str = "/api/v0/uploads/images";
pub const UPLOAD_METRICS_PATH: &str = "/api/v0/uploads/metrics";
pub const EDITOR_CONFIG_PATH: &str = "/api/v0/editor/configs/{name}";
pub const MEDIA_EPOCH_PATH: &str = "/api/v0/editor/media-epoch";

pub const HEALTH_LIVE_PATH: &str = "/health/live";
pub const HEALTH_READY_PATH: &str = "/health/ready";

/// Multipart field names accepted for the uploaded file. The first matching field wins.
pub const UPLOAD_FIELD_NAMES: &[&str] = &["file[]", "file"];

/// Allowance for multipart framing on top of the maximum file size.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Chunk size used when spooling multipart data to disk.
pub const SPOOL_BUFFER_SIZE: usize = 64 * 1024;

pub const SUCCESS_MESSAGE: &str = "Success!";
pub const DEDUPLICATED_MESSAGE: &str = "File uploaded successfully (deduplicated).";
