//! Configuration module
//!
//! Configuration is read once from the environment at startup into a [`Config`].
//! The upload-related part ([`UploadSettings`]) lives behind a [`SettingsHandle`] so it
//! can be re-read on an explicit [`SettingsHandle::reload`] call without restarting.

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

// Common constants
const SERVER_PORT: u16 = 4000;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_FILE_SIZE_MB: u64 = 10;
const MIN_FILE_SIZE_BYTES: u64 = 10;
const CACHE_MAX_AGE_SECS: u64 = 3600;
const DEFAULT_EXTENSIONS: &str = ".jpg,.jpeg,.png,.gif,.webp";
const DEFAULT_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";
const DEFAULT_UPLOAD_ROOT: &str = "./media/uploads";
const DEFAULT_PUBLIC_URL_PREFIX: &str = "/media/uploads/";

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Base configuration for the server process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: LogFormat,
    pub language_code: String,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            log_format: LogFormat::Compact,
            language_code: "en-us".to_string(),
            cors_origins: vec!["*".to_string()],
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
        }
    }
}

/// Size and type limits applied to every upload.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub min_file_size: u64,
    /// Lower-cased, always with a leading dot (".png").
    pub allowed_extensions: BTreeSet<String>,
    /// Lower-cased MIME types without parameters.
    pub allowed_content_types: BTreeSet<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE_MB * 1024 * 1024,
            min_file_size: MIN_FILE_SIZE_BYTES,
            allowed_extensions: parse_extensions(DEFAULT_EXTENSIONS),
            allowed_content_types: parse_content_types(DEFAULT_CONTENT_TYPES),
        }
    }
}

/// Everything the ingestion pipeline needs to accept and persist an upload.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadSettings {
    pub limits: UploadLimits,
    pub storage_root: PathBuf,
    pub public_url_prefix: String,
    pub cache_max_age_secs: u64,
    pub serve_uploads: bool,
}

impl UploadSettings {
    /// Settings rooted at `storage_root` with default limits.
    pub fn with_root(storage_root: impl Into<PathBuf>, public_url_prefix: impl Into<String>) -> Self {
        Self {
            limits: UploadLimits::default(),
            storage_root: storage_root.into(),
            public_url_prefix: public_url_prefix.into(),
            cache_max_age_secs: CACHE_MAX_AGE_SECS,
            serve_uploads: true,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let max_file_size = match env::var("MAX_FILE_SIZE_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be a valid number"))?,
            Err(_) => mib_to_bytes(
                env::var("MAX_FILE_SIZE_MB")
                    .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
                    .parse::<u64>()
                    .unwrap_or(MAX_FILE_SIZE_MB),
            )?,
        };

        let settings = UploadSettings {
            limits: UploadLimits {
                max_file_size,
                min_file_size: env::var("MIN_FILE_SIZE_BYTES")
                    .unwrap_or_else(|_| MIN_FILE_SIZE_BYTES.to_string())
                    .parse()
                    .unwrap_or(MIN_FILE_SIZE_BYTES),
                allowed_extensions: parse_extensions(
                    &env::var("ALLOWED_EXTENSIONS")
                        .unwrap_or_else(|_| DEFAULT_EXTENSIONS.to_string()),
                ),
                allowed_content_types: parse_content_types(
                    &env::var("ALLOWED_CONTENT_TYPES")
                        .unwrap_or_else(|_| DEFAULT_CONTENT_TYPES.to_string()),
                ),
            },
            storage_root: PathBuf::from(
                env::var("UPLOAD_ROOT").unwrap_or_else(|_| DEFAULT_UPLOAD_ROOT.to_string()),
            ),
            public_url_prefix: env::var("PUBLIC_URL_PREFIX")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL_PREFIX.to_string()),
            cache_max_age_secs: env::var("UPLOAD_CACHE_MAX_AGE_SECS")
                .unwrap_or_else(|_| CACHE_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(CACHE_MAX_AGE_SECS),
            serve_uploads: env::var("SERVE_UPLOADS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.limits.max_file_size == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE must be greater than zero"));
        }
        if self.limits.min_file_size > self.limits.max_file_size {
            return Err(anyhow::anyhow!(
                "MIN_FILE_SIZE_BYTES ({}) must not exceed the maximum file size ({})",
                self.limits.min_file_size,
                self.limits.max_file_size
            ));
        }
        if self.limits.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }
        if self.limits.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES must not be empty"));
        }
        if self.public_url_prefix.trim().is_empty() {
            return Err(anyhow::anyhow!("PUBLIC_URL_PREFIX must not be empty"));
        }
        if self.storage_root.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_ROOT must not be empty"));
        }
        Ok(())
    }

    /// Public URL for a stored object.
    pub fn public_url(&self, stored_filename: &str) -> String {
        format!(
            "{}/{}",
            self.public_url_prefix.trim_end_matches('/'),
            stored_filename
        )
    }

    /// Mount path for serving stored objects, when the prefix is a local path.
    pub fn serve_path(&self) -> Option<String> {
        let prefix = self.public_url_prefix.trim_end_matches('/');
        if self.serve_uploads && prefix.starts_with('/') && prefix.len() > 1 {
            Some(prefix.to_string())
        } else {
            None
        }
    }
}

fn parse_extensions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('.') {
                s
            } else {
                format!(".{}", s)
            }
        })
        .collect()
}

fn parse_content_types(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Raw `EDITOR_CONFIGS` value; blank counts as unset.
pub fn editor_configs_from_env() -> Option<String> {
    env::var("EDITOR_CONFIGS")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

fn mib_to_bytes(mib: u64) -> Result<u64, anyhow::Error> {
    mib.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large"))
}

/// Process-wide handle to the current [`UploadSettings`].
///
/// Readers take a cheap `Arc` snapshot and keep it for the duration of one request.
/// `reload` swaps in freshly read settings; a failed reload leaves the old value in place.
#[derive(Clone, Debug)]
pub struct SettingsHandle {
    current: Arc<RwLock<Arc<UploadSettings>>>,
}

impl SettingsHandle {
    pub fn new(settings: UploadSettings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    pub fn snapshot(&self) -> Arc<UploadSettings> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the current settings after validating them.
    pub fn replace(&self, settings: UploadSettings) -> Result<(), anyhow::Error> {
        settings.validate()?;
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(settings);
        Ok(())
    }

    /// Re-read upload settings from the environment.
    pub fn reload(&self) -> Result<(), anyhow::Error> {
        let settings = UploadSettings::from_env()?;
        self.replace(settings)?;
        tracing::info!("Upload settings reloaded");
        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub upload: UploadSettings,
    /// Raw JSON for named editor option sets (`EDITOR_CONFIGS`).
    pub editor_configs: Option<String>,
}

impl Config {
    /// Configuration with default process settings around the given upload settings.
    pub fn with_upload(upload: UploadSettings) -> Self {
        Self {
            base: BaseConfig::default(),
            upload,
            editor_configs: None,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format,
            language_code: env::var("LANGUAGE_CODE").unwrap_or_else(|_| "en-us".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
        };

        let config = Config {
            base,
            upload: UploadSettings::from_env()?,
            editor_configs: editor_configs_from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be non-zero"));
        }
        self.upload.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.base.log_format
    }

    pub fn language_code(&self) -> &str {
        &self.base.language_code
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.base.http_concurrency_limit
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.upload.limits.max_file_size
    }
}
