//! Document fetch: copy the source presentation into the job workspace.
//!
//! The office renderer needs a real file, named like the original so that
//! its output (`<stem>.pdf`) is predictable. The workspace directory is owned
//! by the caller; this stage only writes one file into it.

use super::input::Job;
use crate::error::{ConvertError, StorageError};
use crate::storage::ObjectStorage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Download `job.source_key` to `<workspace>/<job.source_file_name>`.
pub async fn fetch_source(
    storage: &dyn ObjectStorage,
    job: &Job,
    workspace: &Path,
) -> Result<PathBuf, ConvertError> {
    let fetch_error = |source: StorageError| ConvertError::Fetch {
        location: job.storage_location.clone(),
        key: job.source_key.clone(),
        source,
    };

    let bytes = storage
        .get_object(&job.storage_location, &job.source_key)
        .await
        .map_err(fetch_error)?;

    let path = workspace.join(&job.source_file_name);
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        fetch_error(StorageError::Io {
            path: path.clone(),
            source: e,
        })
    })?;

    info!(
        "Fetched {}/{} ({} bytes) → {}",
        job.storage_location,
        job.source_key,
        bytes.len(),
        path.display()
    );

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::ConversionRequest;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn writes_under_original_name() {
        let storage = MemoryStorage::new();
        storage.insert("bucket", "job/deck.pptx", b"PK\x03\x04".to_vec(), "application/octet-stream");
        let job = ConversionRequest::new("bucket", "job/deck.pptx", "deck.pptx")
            .validate()
            .unwrap();
        let workspace = tempfile::tempdir().unwrap();

        let path = fetch_source(&storage, &job, workspace.path()).await.unwrap();

        assert_eq!(path, workspace.path().join("deck.pptx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn storage_failure_is_fetch_error() {
        let storage = MemoryStorage::new();
        let job = ConversionRequest::new("bucket", "job/missing.pptx", "missing.pptx")
            .validate()
            .unwrap();
        let workspace = tempfile::tempdir().unwrap();

        let err = fetch_source(&storage, &job, workspace.path()).await.unwrap_err();
        assert!(matches!(err, ConvertError::Fetch { .. }), "got: {err:?}");
        assert!(!workspace.path().join("missing.pptx").exists());
    }
}
