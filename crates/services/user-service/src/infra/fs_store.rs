//! Filesystem-backed object store.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use common::{AppError, AppResult, ObjectStorageConfig};

use crate::store::{key_from_location, object_url, ObjectStore};

/// Object store writing payloads below a root directory.
///
/// Download URLs are built from the configured public base URL, which is
/// expected to serve the root directory.
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn from_config(config: &ObjectStorageConfig) -> Self {
        Self::new(&config.root_dir, &config.public_base_url)
    }

    /// Root directory objects are written under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage key to a path inside the root directory.
    ///
    /// Keys must be relative and made of plain segments only.
    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        let bad_segment = key
            .split('/')
            .any(|s| s.is_empty() || s == "." || s == "..");

        if !plain || bad_segment {
            return Err(AppError::bad_request(format!("Invalid object key: {}", key)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: String) -> AppResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, data).await?;
        tracing::debug!(key, content_type = %content_type, "Stored object at {}", path.display());
        Ok(())
    }

    async fn download_url(&self, key: &str) -> AppResult<String> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(object_url(&self.public_base_url, key)),
            Ok(_) => Err(AppError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, location: &str) -> AppResult<()> {
        let key = key_from_location(&self.public_base_url, location)?;
        let path = self.path_for(&key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
