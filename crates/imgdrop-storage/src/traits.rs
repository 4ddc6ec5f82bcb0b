//! Storage abstraction trait
//!
//! This module defines the Storage trait implemented by the content-addressed object store.

use async_trait::async_trait;
use imgdrop_core::{ContentDigest, UploadError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create storage directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CreateDirectory { path, source } => UploadError::FailedToCreateDirectory {
                path: path.display().to_string(),
                source,
            },
            StorageError::WriteFailed { path, source } => UploadError::FailedToSaveFile {
                path: path.display().to_string(),
                source,
            },
            StorageError::InvalidKey(key) => UploadError::FailedToSaveFile {
                path: key.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, format!("invalid key {key}")),
            },
            StorageError::NotFound(key) => UploadError::UnexpectedIo(io::Error::new(
                io::ErrorKind::NotFound,
                format!("object {key} not found"),
            )),
            StorageError::IoError(e) => UploadError::UnexpectedIo(e),
        }
    }
}

/// A persisted object, or the existing object an upload was deduplicated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub stored_filename: String,
    pub path: PathBuf,
    pub deduplicated: bool,
    /// Bytes written; zero when deduplicated.
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// Objects are immutable and addressed by `{digest}_{stem}{extension}`. A store
/// never exposes a partially written object under its final name.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `reader` as `{digest}_{stem[..50]}{extension}` unless an object with the
    /// same digest already exists, in which case that object is returned and `reader`
    /// is left untouched.
    async fn store(
        &self,
        digest: &ContentDigest,
        stem: &str,
        extension: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StoredObject>;

    /// Stored filename of an existing object with this digest, if any.
    async fn find_by_digest(&self, digest: &ContentDigest) -> StorageResult<Option<String>>;

    /// Check if a stored object exists
    async fn exists(&self, stored_filename: &str) -> StorageResult<bool>;

    /// Read a stored object back
    async fn read(&self, stored_filename: &str) -> StorageResult<Vec<u8>>;

    /// Create the storage root if missing.
    async fn ensure_root(&self) -> StorageResult<()>;

    fn root(&self) -> &Path;
}
