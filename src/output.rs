//! Result types returned by a successful conversion.

use serde::{Deserialize, Serialize};

/// One slide image written to object storage.
///
/// Serialises as `{slideNumber, storageKey, fileName}`, the shape of the
/// entries in the success envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSlide {
    /// 1-based, contiguous, in upload order.
    pub slide_number: usize,
    /// `"{jobId}/{base}_slide_{nnn}.jpg"`.
    pub storage_key: String,
    /// Last path segment of `storage_key`.
    pub file_name: String,

    /// Size of the uploaded JPEG.
    #[serde(skip)]
    pub size_bytes: usize,
    /// The optimizer gave up before meeting the byte budget.
    #[serde(skip)]
    pub floor_reached: bool,
}

/// Complete result of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub job_id: String,
    /// Always equal to `images.len()`.
    pub slide_count: usize,
    /// Ordered by `slide_number`.
    pub images: Vec<PublishedSlide>,
    pub stats: ConversionStats,
}

/// Timing and size figures for a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Office render plus rasterisation.
    pub render_duration_ms: u64,
    /// Sum over slides of the time spent in the optimizer.
    pub optimize_duration_ms: u64,
    /// Sum over slides of the time spent uploading.
    pub publish_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Bytes written to storage across all slides.
    pub uploaded_bytes: u64,
    /// Slides published above the byte budget.
    pub degraded_slides: usize,
}
