use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::security;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct StorageInner {
    /// Canonical physical root; every resolved path starts with it.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
    pub(crate) tmp_ttl: Duration,
}

/// Cheaply clonable handle to a sandboxed directory.
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Storage {
    #[must_use = "The storage is not ready until you call .connect()"]
    pub fn builder(root: impl Into<PathBuf>) -> StorageBuilder {
        StorageBuilder::new(root.into())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Physical location of a relative path, after sandbox validation.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] if the path escapes the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        security::resolve_path(&self.inner.root, path)
    }

    /// # Errors
    /// [`StorageError::FileNotFound`] when absent, [`StorageError::Io`] otherwise.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved).await.map_err(|err| not_found_or_io(err, &resolved, "Read failed"))
    }

    /// Writes `data` atomically: unique temporary, `fsync`, rename over the target.
    ///
    /// Parent directories are created as needed. An existing file is replaced.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] or [`StorageError::Io`].
    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directories for {}", resolved.display()))?;
        }

        let temp = self.tmp_path(&resolved);
        if let Err(err) = Self::write_synced(&temp, data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err);
        }

        if let Err(err) = fs::rename(&temp, &resolved).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::Io {
                source: err,
                context: Some(
                    format!("Atomic swap failed: {} -> {}", temp.display(), resolved.display())
                        .into(),
                ),
            });
        }

        if let Some(parent) = resolved.parent() {
            Self::sync_dir(parent).await;
        }

        debug!(path = %resolved.display(), bytes = data.len(), "File saved atomically");
        Ok(())
    }

    /// # Errors
    /// [`StorageError::FileNotFound`] when absent.
    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        fs::remove_file(&resolved)
            .await
            .map_err(|err| not_found_or_io(err, &resolved, "Failed to delete"))?;
        debug!(path = %resolved.display(), "File deleted");
        Ok(())
    }

    /// Deletes every path, ignoring ones already gone. Used to roll back partial uploads.
    pub async fn delete_all<P: AsRef<Path>>(&self, paths: &[P]) {
        for path in paths {
            match self.delete(path).await {
                Ok(()) | Err(StorageError::FileNotFound { .. }) => {},
                Err(err) => warn!(error = %err, "Failed to roll back stored file"),
            }
        }
    }

    /// # Errors
    /// Only for sandbox violations.
    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve(path)?.is_file())
    }

    /// Removes stale temporaries left by interrupted writes. Returns how many were removed.
    pub async fn purge_tmp(&self) -> usize {
        maintenance::purge_tmp(&self.inner.root, self.inner.tmp_ttl).await
    }

    fn tmp_path(&self, target: &Path) -> PathBuf {
        let counter = self.inner.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("upload");
        target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id()))
    }

    async fn write_synced(temp: &Path, data: &[u8]) -> Result<(), StorageError> {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(temp)
            .await
            .context(format!("Temp creation failed: {}", temp.display()))?;
        file.write_all(data).await.context("Write failed")?;
        file.sync_all().await.context("Hardware sync failed")?;
        Ok(())
    }

    async fn sync_dir(path: &Path) {
        match fs::File::open(path).await {
            Ok(dir) => {
                if let Err(err) = dir.sync_all().await {
                    warn!(path = %path.display(), error = %err, "Directory sync failed");
                }
            },
            Err(err) => warn!(path = %path.display(), error = %err, "Directory open failed"),
        }
    }
}

fn not_found_or_io(err: std::io::Error, path: &Path, what: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::FileNotFound { message: path.display().to_string().into(), context: None }
    } else {
        StorageError::Io { source: err, context: Some(format!("{what}: {}", path.display()).into()) }
    }
}
