//! Key/value cache used to memoize derived configuration values.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value, ttl: Duration);

    async fn delete(&self, key: &str);

    /// Remove every entry whose key starts with `prefix`. Returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> usize;
}

/// In-process cache; entries are dropped lazily when read after expiry.
#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<HashMap<String, (Value, Instant)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let guard = self.inner.lock().await;
        let now = Instant::now();
        guard.values().filter(|(_, expires_at)| now < *expires_at).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut guard = self.inner.lock().await;
        if let Some((value, expires_at)) = guard.get(key) {
            if Instant::now() >= *expires_at {
                guard.remove(key);
                return None;
            }
            return Some(value.clone());
        }
        None
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let mut guard = self.inner.lock().await;
        guard.insert(key.to_string(), (value, Instant::now() + ttl));
    }

    async fn delete(&self, key: &str) {
        self.inner.lock().await.remove(key);
    }

    async fn delete_prefix(&self, prefix: &str) -> usize {
        let mut guard = self.inner.lock().await;
        let before = guard.len();
        guard.retain(|key, _| !key.starts_with(prefix));
        before - guard.len()
    }
}
