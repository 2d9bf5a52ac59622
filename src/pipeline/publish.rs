//! Publication: write an optimized slide to object storage.
//!
//! Keys are derived from the job alone, so re-running a job overwrites the
//! same objects. Nothing is rolled back when a later slide fails.

use super::input::Job;
use super::optimize::OptimizedImage;
use crate::error::ConvertError;
use crate::output::PublishedSlide;
use crate::storage::ObjectStorage;
use tracing::debug;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// PUT `image` at `job.slide_key(image.ordinal)` in the job's location.
pub async fn publish_slide(
    storage: &dyn ObjectStorage,
    job: &Job,
    image: &OptimizedImage,
) -> Result<PublishedSlide, ConvertError> {
    let key = job.slide_key(image.ordinal);
    let size_bytes = image.len();

    storage
        .put_object(
            &job.storage_location,
            &key,
            image.bytes.clone(),
            JPEG_CONTENT_TYPE,
        )
        .await
        .map_err(|source| ConvertError::Publish {
            slide: image.ordinal,
            key: key.clone(),
            source,
        })?;

    debug!("Published slide {} → {}/{}", image.ordinal, job.storage_location, key);

    Ok(PublishedSlide {
        slide_number: image.ordinal,
        storage_key: key,
        file_name: job.slide_file_name(image.ordinal),
        size_bytes,
        floor_reached: image.floor_reached,
    })
}
