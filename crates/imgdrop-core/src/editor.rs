//! Editor option sets and the media cache-busting epoch.
//!
//! Named option sets come from `EDITOR_CONFIGS` (a JSON object of objects) and are merged
//! over a built-in default. Lookups are memoized in a [`Cache`].

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cache::Cache;

pub type EditorOptions = Map<String, Value>;

pub const DEFAULT_CONFIG_NAME: &str = "default";
pub const CONFIG_CACHE_PREFIX: &str = "editor_config:";
pub const CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);
pub const MEDIA_EPOCH_KEY: &str = "media_epoch";
pub const MEDIA_EPOCH_TTL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorConfigError {
    #[error("EDITOR_CONFIGS setting must be a JSON object")]
    NotAnObject,

    #[error("No configuration named '{0}' found in EDITOR_CONFIGS")]
    NotFound(String),

    #[error("EDITOR_CONFIGS[\"{0}\"] must be a JSON object")]
    InvalidEntry(String),
}

/// Editor `lang` option for a site language code.
pub fn editor_lang(language_code: &str) -> &'static str {
    match language_code {
        "zh-Hans" => "zh_CN",
        "ja-jp" => "ja_JP",
        "ko-kr" => "ko_KR",
        _ => "en_US",
    }
}

/// The option set every named set is merged over.
pub fn default_options(language_code: &str) -> EditorOptions {
    let value = json!({
        "width": "%90",
        "height": 360,
        "preview_theme": "light",
        "typewriterMode": "True",
        "mode": "ir",
        "debugger": "false",
        "value": "",
        "theme": "classic",
        "icon": "ant",
        "outline": "false",
        "lang": editor_lang(language_code),
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn parse_configs(raw: Option<&str>) -> Option<Value> {
    raw.map(|raw| match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "EDITOR_CONFIGS is not valid JSON");
            Value::Null
        }
    })
}

#[derive(Clone)]
pub struct EditorConfigStore {
    configs: Arc<RwLock<Option<Value>>>,
    language_code: String,
    cache: Arc<dyn Cache>,
}

impl EditorConfigStore {
    /// `raw` is the unparsed `EDITOR_CONFIGS` value; unparseable JSON surfaces as
    /// [`EditorConfigError::NotAnObject`] on lookup.
    pub fn new(raw: Option<&str>, language_code: impl Into<String>, cache: Arc<dyn Cache>) -> Self {
        Self {
            configs: Arc::new(RwLock::new(parse_configs(raw))),
            language_code: language_code.into(),
            cache,
        }
    }

    /// Swap in a new `EDITOR_CONFIGS` value and drop every memoized lookup.
    pub async fn replace(&self, raw: Option<&str>) {
        let configs = parse_configs(raw);
        {
            let mut guard = self
                .configs
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = configs;
        }
        self.invalidate_all().await;
        tracing::info!("Editor option sets replaced");
    }

    fn resolve(&self, name: &str) -> Result<EditorOptions, EditorConfigError> {
        let mut options = default_options(&self.language_code);

        let guard = self
            .configs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let configs = match &*guard {
            None => {
                return if name == DEFAULT_CONFIG_NAME {
                    Ok(options)
                } else {
                    Err(EditorConfigError::NotFound(name.to_string()))
                };
            }
            Some(Value::Object(configs)) => configs,
            Some(_) => return Err(EditorConfigError::NotAnObject),
        };

        match configs.get(name) {
            Some(Value::Object(overrides)) => {
                for (key, value) in overrides {
                    options.insert(key.clone(), value.clone());
                }
                Ok(options)
            }
            Some(_) => Err(EditorConfigError::InvalidEntry(name.to_string())),
            None if name == DEFAULT_CONFIG_NAME => Ok(options),
            None => Err(EditorConfigError::NotFound(name.to_string())),
        }
    }

    pub async fn get(&self, name: &str) -> Result<EditorOptions, EditorConfigError> {
        let key = format!("{}{}", CONFIG_CACHE_PREFIX, name);
        if let Some(Value::Object(cached)) = self.cache.get(&key).await {
            tracing::debug!(config = %name, "Editor config cache hit");
            return Ok(cached);
        }

        let options = self.resolve(name)?;
        self.cache
            .set(&key, Value::Object(options.clone()), CONFIG_CACHE_TTL)
            .await;
        tracing::debug!(config = %name, ttl_secs = CONFIG_CACHE_TTL.as_secs(), "Cached editor config");
        Ok(options)
    }

    /// Look up `name`, falling back to the default set when it cannot be resolved.
    pub async fn get_or_default(&self, name: &str) -> EditorOptions {
        match self.get(name).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(config = %name, error = %e, "Falling back to default editor config");
                default_options(&self.language_code)
            }
        }
    }

    pub async fn invalidate(&self, name: &str) {
        self.cache
            .delete(&format!("{}{}", CONFIG_CACHE_PREFIX, name))
            .await;
        tracing::debug!(config = %name, "Invalidated editor config cache");
    }

    pub async fn invalidate_all(&self) {
        let removed = self.cache.delete_prefix(CONFIG_CACHE_PREFIX).await;
        tracing::debug!(removed, "Invalidated all editor config caches");
    }

    /// Populate the cache with the default set.
    pub async fn warm(&self) -> Result<(), EditorConfigError> {
        self.get(DEFAULT_CONFIG_NAME).await.map(|_| ())
    }
}

/// Short token appended to static asset URLs so clients refetch after a change.
#[derive(Clone)]
pub struct MediaEpoch {
    public_prefix: String,
    cache: Arc<dyn Cache>,
}

impl MediaEpoch {
    pub fn new(public_prefix: impl Into<String>, cache: Arc<dyn Cache>) -> Self {
        Self {
            public_prefix: public_prefix.into(),
            cache,
        }
    }

    pub async fn current(&self) -> String {
        if let Some(Value::String(epoch)) = self.cache.get(MEDIA_EPOCH_KEY).await {
            return epoch;
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let hash = Sha256::digest(format!("{}:{}", self.public_prefix, nanos).as_bytes());
        let epoch = hex::encode(hash)[..8].to_string();

        self.cache
            .set(MEDIA_EPOCH_KEY, Value::String(epoch.clone()), MEDIA_EPOCH_TTL)
            .await;
        epoch
    }

    pub async fn invalidate(&self) {
        self.cache.delete(MEDIA_EPOCH_KEY).await;
        tracing::debug!("Invalidated media epoch");
    }
}
