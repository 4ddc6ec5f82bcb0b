//! In-memory upload metrics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadResult {
    Successful,
    Failed,
}

#[derive(Debug, Default)]
struct Counter {
    count: AtomicU64,
    total_bytes: AtomicU64,
    total_elapsed_ms: AtomicU64,
}

impl Counter {
    fn record(&self, elapsed: Duration, bytes: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.total_elapsed_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            count: self.count.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            total_elapsed_ms: self.total_elapsed_ms.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub count: u64,
    pub total_bytes: u64,
    pub total_elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub successful: CounterSnapshot,
    pub failed: CounterSnapshot,
}

/// Upload counters shared by all request tasks.
#[derive(Debug, Default)]
pub struct UploadMetrics {
    successful: Counter,
    failed: Counter,
}

impl UploadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: UploadResult, elapsed: Duration, bytes: u64) {
        match result {
            UploadResult::Successful => self.successful.record(elapsed, bytes),
            UploadResult::Failed => self.failed.record(elapsed, bytes),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            successful: self.successful.snapshot(),
            failed: self.failed.snapshot(),
        }
    }
}
