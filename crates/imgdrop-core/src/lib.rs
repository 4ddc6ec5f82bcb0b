//! Imgdrop Core Library
//!
//! Configuration, error taxonomy, data model and the small key/value cache shared by
//! the imgdrop crates.

pub mod cache;
pub mod config;
pub mod editor;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use cache::{Cache, MemoryCache};
pub use config::{
    editor_configs_from_env, BaseConfig, Config, LogFormat, SettingsHandle, UploadLimits,
    UploadSettings,
};
pub use editor::{EditorConfigError, EditorConfigStore, EditorOptions, MediaEpoch};
pub use error::{ErrorKind, ErrorMetadata, LogLevel, UploadError};
pub use models::{ContentDigest, UploadOutcome, ValidationOutcome};
