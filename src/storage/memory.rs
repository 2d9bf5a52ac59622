//! In-process backend, used by tests and dry runs.

use super::ObjectStorage;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An object held by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Thread-safe in-memory [`ObjectStorage`].
///
/// Counts every PUT attempt and can be told to reject PUTs after a number
/// of successful ones, which is how publish failures are exercised.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    put_attempts: AtomicUsize,
    fail_puts_after: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every PUT after the first `n` succeed.
    pub fn failing_puts_after(n: usize) -> Self {
        Self {
            fail_puts_after: Some(n),
            ..Self::default()
        }
    }

    /// Seed an object, e.g. the source presentation.
    pub fn insert(&self, location: &str, key: &str, body: Vec<u8>, content_type: &str) {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            (location.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn get(&self, location: &str, key: &str) -> Option<StoredObject> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(&(location.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored under `location`, sorted.
    pub fn keys(&self, location: &str) -> Vec<String> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .keys()
            .filter(|(loc, _)| loc == location)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Number of PUT calls received, successful or not.
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn get_object(&self, location: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.get(location, key)
            .map(|o| o.body)
            .ok_or_else(|| StorageError::NotFound {
                location: location.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object(
        &self,
        location: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let attempt = self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_puts_after, Some(limit) if attempt >= limit) {
            return Err(StorageError::Service(format!("PUT rejected: {location}/{key}")));
        }
        self.insert(location, key, body, content_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_and_listing() {
        let storage = MemoryStorage::new();
        storage
            .put_object("bucket", "job/b.jpg", vec![2], "image/jpeg")
            .await
            .unwrap();
        storage
            .put_object("bucket", "job/a.jpg", vec![1], "image/jpeg")
            .await
            .unwrap();

        assert_eq!(storage.keys("bucket"), vec!["job/a.jpg", "job/b.jpg"]);
        assert_eq!(storage.get_object("bucket", "job/a.jpg").await.unwrap(), vec![1]);
        assert_eq!(storage.put_attempts(), 2);
        assert!(storage.keys("other").is_empty());
    }

    #[tokio::test]
    async fn failing_puts() {
        let storage = MemoryStorage::failing_puts_after(1);
        storage.put_object("b", "k1", vec![], "image/jpeg").await.unwrap();
        let err = storage.put_object("b", "k2", vec![], "image/jpeg").await.unwrap_err();
        assert!(err.to_string().contains("k2"));
        assert_eq!(storage.put_attempts(), 2);
        assert!(storage.get("b", "k2").is_none());
    }
}
