//! Application state shared by all handlers.

use imgdrop_core::{
    editor_configs_from_env, Cache, Config, EditorConfigStore, MediaEpoch, MemoryCache,
    SettingsHandle,
};
use std::sync::Arc;

use crate::services::ingestion::IngestionService;
use crate::services::metrics::UploadMetrics;

#[derive(Clone)]
pub struct AppState {
    /// Current upload settings; handlers take one snapshot per request.
    pub settings: SettingsHandle,
    pub ingestion: IngestionService,
    pub metrics: Arc<UploadMetrics>,
    pub editor_configs: EditorConfigStore,
    pub media_epoch: MediaEpoch,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let metrics = Arc::new(UploadMetrics::new());

        Self {
            settings: SettingsHandle::new(config.upload.clone()),
            ingestion: IngestionService::new(metrics.clone()),
            metrics,
            editor_configs: EditorConfigStore::new(
                config.editor_configs.as_deref(),
                config.language_code(),
                cache.clone(),
            ),
            media_epoch: MediaEpoch::new(config.upload.public_url_prefix.clone(), cache),
        }
    }

    /// Re-read upload settings and editor option sets from the environment.
    ///
    /// A failed settings reload keeps the previous values and leaves the caches alone.
    pub async fn reload(&self) -> Result<(), anyhow::Error> {
        self.settings.reload()?;
        self.editor_configs
            .replace(editor_configs_from_env().as_deref())
            .await;
        self.clear_caches().await;
        Ok(())
    }

    /// Drop everything memoized from configuration.
    pub async fn clear_caches(&self) {
        self.editor_configs.invalidate_all().await;
        self.media_epoch.invalidate().await;
    }
}
