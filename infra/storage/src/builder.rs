use crate::engine::{Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Temporaries younger than this may belong to an in-flight write of another process.
const DEFAULT_TMP_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct StorageBuilder {
    root: PathBuf,
    create: bool,
    tmp_ttl: Duration,
}

impl StorageBuilder {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root, create: true, tmp_ttl: DEFAULT_TMP_TTL }
    }

    /// Create the root directory when missing. On by default.
    #[must_use]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }

    /// Minimum age before an orphaned temporary is purged.
    #[must_use]
    pub const fn tmp_ttl(mut self, ttl: Duration) -> Self {
        self.tmp_ttl = ttl;
        self
    }

    /// Bootstraps and canonicalizes the root, then purges stale temporaries.
    ///
    /// # Errors
    /// [`StorageError::Io`] if the root is missing (with `create(false)`) or cannot be
    /// created or resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = &self.root;

        if self.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;
        info!(path = %canonical.display(), "Storage root ready");

        let storage = Storage {
            inner: Arc::new(StorageInner {
                root: canonical,
                tmp_counter: AtomicU64::new(1),
                tmp_ttl: self.tmp_ttl,
            }),
        };
        storage.purge_tmp().await;

        Ok(storage)
    }
}
