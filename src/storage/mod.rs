//! Object storage capability.
//!
//! The pipeline never talks to a storage SDK directly. It receives an
//! [`ObjectStorage`] at construction time, which keeps the core testable
//! against [`MemoryStorage`] and lets the CLI target a plain directory
//! through [`LocalStorage`].
//!
//! | Backend | Location means | Key means |
//! |---------|----------------|-----------|
//! | [`S3Storage`] | bucket name | object key |
//! | [`LocalStorage`] | sub-directory of the root | relative file path |
//! | [`MemoryStorage`] | map namespace | map key |

mod local;
mod memory;
mod s3;

pub use local::LocalStorage;
pub use memory::{MemoryStorage, StoredObject};
pub use s3::S3Storage;

use crate::error::StorageError;
use async_trait::async_trait;

/// Minimal GET/PUT surface the conversion pipeline needs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Download a whole object into memory.
    async fn get_object(&self, location: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Upload `body` under `key`, replacing any existing object.
    async fn put_object(
        &self,
        location: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}
