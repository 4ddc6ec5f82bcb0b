use crate::naming::{digest_prefix, stored_filename};
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use async_trait::async_trait;
use imgdrop_core::ContentDigest;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

const TEMP_SUFFIX: &str = ".tmp";

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage implementation
///
/// All objects live flat in one directory. Writes go to a `.tmp` sibling first and
/// are renamed into place, so a final name never refers to a partial file.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path`. The directory is created lazily.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        LocalStorage {
            base_path: base_path.into(),
        }
    }

    /// Convert a stored filename to its path, rejecting anything that is not a plain name.
    fn object_path(&self, stored_filename: &str) -> StorageResult<PathBuf> {
        if stored_filename.is_empty()
            || stored_filename.contains("..")
            || stored_filename.contains('/')
            || stored_filename.contains('\\')
        {
            return Err(StorageError::InvalidKey(stored_filename.to_string()));
        }
        Ok(self.base_path.join(stored_filename))
    }

    async fn create_root(&self) -> StorageResult<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);

        builder
            .create(&self.base_path)
            .await
            .map_err(|source| StorageError::CreateDirectory {
                path: self.base_path.clone(),
                source,
            })
    }

    /// Open a fresh temp sibling of `final_path`. Falls back to a unique name when
    /// another writer already holds `{final}.tmp`.
    async fn open_temp(&self, final_path: &Path) -> StorageResult<(PathBuf, fs::File)> {
        let primary = append_suffix(final_path, TEMP_SUFFIX);
        match create_new(&primary).await {
            Ok(file) => return Ok((primary, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %primary.display(), "Temp file busy, using a unique name");
            }
            Err(source) => {
                return Err(StorageError::WriteFailed {
                    path: primary,
                    source,
                })
            }
        }

        let unique = append_suffix(
            final_path,
            &format!(
                ".{}-{}{}",
                std::process::id(),
                TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
                TEMP_SUFFIX
            ),
        );
        let file = create_new(&unique)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: unique.clone(),
                source,
            })?;
        Ok((unique, file))
    }

    async fn write_temp(
        file: &mut fs::File,
        temp_path: &Path,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let write_failed = |source| StorageError::WriteFailed {
            path: temp_path.to_path_buf(),
            source,
        };

        let written = tokio::io::copy(reader, file).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;
        file.sync_all().await.map_err(write_failed)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp_path, std::fs::Permissions::from_mode(FILE_MODE))
                .await
                .map_err(write_failed)?;
        }

        Ok(written)
    }
}

async fn create_new(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Removes the temp file when dropped unless disarmed after a successful rename.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            // Drop cannot await; a single blocking unlink is acceptable here.
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed temp file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove temp file"
                ),
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(
        &self,
        digest: &ContentDigest,
        stem: &str,
        extension: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StoredObject> {
        let name = stored_filename(digest, stem, extension);
        let final_path = self.object_path(&name)?;

        if fs::try_exists(&final_path).await.unwrap_or(false) {
            tracing::info!(stored_filename = %name, "Object already exists, deduplicated");
            return Ok(StoredObject {
                stored_filename: name,
                path: final_path,
                deduplicated: true,
                size_bytes: 0,
            });
        }

        if let Some(existing) = self.find_by_digest(digest).await? {
            tracing::info!(
                stored_filename = %existing,
                digest = %digest,
                "Object with same content already exists, deduplicated"
            );
            let path = self.object_path(&existing)?;
            return Ok(StoredObject {
                stored_filename: existing,
                path,
                deduplicated: true,
                size_bytes: 0,
            });
        }

        let start = std::time::Instant::now();

        self.create_root().await?;

        let (temp_path, mut file) = self.open_temp(&final_path).await?;
        let mut guard = TempFileGuard::new(temp_path.clone());

        let size = Self::write_temp(&mut file, &temp_path, reader).await?;
        drop(file);

        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: final_path.clone(),
                source,
            })?;
        guard.disarm();

        tracing::info!(
            path = %final_path.display(),
            stored_filename = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(StoredObject {
            stored_filename: name,
            path: final_path,
            deduplicated: false,
            size_bytes: size,
        })
    }

    async fn find_by_digest(&self, digest: &ContentDigest) -> StorageResult<Option<String>> {
        let prefix = digest_prefix(digest);

        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(
                    path = %self.base_path.display(),
                    error = %e,
                    "Could not scan storage directory for duplicates"
                );
                return Ok(None);
            }
        };

        let mut found: Option<String> = None;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(&prefix) || name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            // Lowest name wins so repeated lookups agree.
            if found.as_ref().map_or(true, |current| name < *current) {
                found = Some(name);
            }
        }

        Ok(found)
    }

    async fn exists(&self, stored_filename: &str) -> StorageResult<bool> {
        let path = self.object_path(stored_filename)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn read(&self, stored_filename: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(stored_filename)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(stored_filename.to_string()));
        }

        Ok(fs::read(&path).await?)
    }

    async fn ensure_root(&self) -> StorageResult<()> {
        self.create_root().await
    }

    fn root(&self) -> &Path {
        &self.base_path
    }
}
