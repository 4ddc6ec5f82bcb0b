pub mod ingestion;
pub mod metrics;

pub use ingestion::{IngestedFile, IngestionService};
pub use metrics::{MetricsSnapshot, UploadMetrics, UploadResult};
