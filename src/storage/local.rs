//! Directory-tree backend for local runs.

use super::ObjectStorage;
use crate::error::StorageError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Stores object `key` of location `loc` at `<root>/<loc>/<key>`.
///
/// Locations and keys must be relative paths made of plain components;
/// anything that could escape `root` is rejected.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location/key pair to a file path under the root.
    pub fn object_path(&self, location: &str, key: &str) -> Result<PathBuf, StorageError> {
        for part in [location, key] {
            let path = Path::new(part);
            let plain = path.components().all(|c| matches!(c, Component::Normal(_)));
            if part.is_empty() || !plain {
                return Err(StorageError::InvalidAddress(format!("{location}/{key}")));
            }
        }
        Ok(self.root.join(location).join(key))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn get_object(&self, location: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(location, key)?;
        debug!("GET {}", path.display());

        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    location: location.to_string(),
                    key: key.to_string(),
                }
            } else {
                StorageError::Io { path, source: e }
            }
        })
    }

    async fn put_object(
        &self,
        location: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(location, key)?;
        debug!("PUT {} ({} bytes)", path.display(), body.len());

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| StorageError::Io { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_escaping_keys() {
        let storage = LocalStorage::new("/srv/objects");
        assert!(storage.object_path("bucket", "../etc/passwd").is_err());
        assert!(storage.object_path("bucket", "/abs/key").is_err());
        assert!(storage.object_path("..", "key").is_err());
        assert!(storage.object_path("", "key").is_err());
        assert_eq!(
            storage.object_path("bucket", "job/deck.pptx").unwrap(),
            PathBuf::from("/srv/objects/bucket/job/deck.pptx")
        );
    }

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .put_object("bucket", "job/deck_slide_001.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        let data = storage
            .get_object("bucket", "job/deck_slide_001.jpg")
            .await
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);
        assert!(dir.path().join("bucket/job/deck_slide_001.jpg").is_file());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.get_object("bucket", "job/none.pptx").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }), "got: {err:?}");
    }
}
