//! Amazon S3 backend.

use super::ObjectStorage;
use crate::error::StorageError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

/// S3-backed [`ObjectStorage`]; the storage location is the bucket name.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Wrap a pre-configured client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration
    /// (environment, profile, or instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn get_object(&self, location: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        debug!("GET s3://{}/{}", location, key);

        let response = self
            .client
            .get_object()
            .bucket(location)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service_err) if service_err.is_no_such_key() => StorageError::NotFound {
                    location: location.to_string(),
                    key: key.to_string(),
                },
                _ => StorageError::Service(DisplayErrorContext(&e).to_string()),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Service(format!("Failed to read object body: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        location: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        debug!("PUT s3://{}/{} ({} bytes)", location, key, body.len());

        self.client
            .put_object()
            .bucket(location)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Service(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
