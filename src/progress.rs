//! Progress-callback trait for per-slide conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through a job. The CLI uses it to drive a
//! terminal progress bar; a service can forward events to its own telemetry.
//!
//! # Example
//!
//! ```rust
//! use pptx2jpeg::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     published: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_slide_published(&self, slide: usize, total: usize, storage_key: &str) {
//!         self.published.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Slide {slide}/{total} → {storage_key}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { published: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes a job.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for one job arrive sequentially, in slide
/// order.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the request has been validated.
    fn on_job_start(&self, job_id: &str) {
        let _ = job_id;
    }

    /// Called after rasterisation, before the page-count guard.
    ///
    /// # Arguments
    /// * `page_count` : number of rendered pages
    /// * `duration_ms`: wall-clock time of PDF rendering plus rasterisation
    fn on_render_complete(&self, page_count: usize, duration_ms: u64) {
        let _ = (page_count, duration_ms);
    }

    /// Called when a slide has been encoded.
    ///
    /// # Arguments
    /// * `slide`        : 1-indexed slide number
    /// * `total`        : slides in the job
    /// * `bytes`        : size of the JPEG that will be uploaded
    /// * `floor_reached`: the optimizer gave up above the byte budget
    fn on_slide_optimized(&self, slide: usize, total: usize, bytes: usize, floor_reached: bool) {
        let _ = (slide, total, bytes, floor_reached);
    }

    /// Called after a slide has been written to storage.
    fn on_slide_published(&self, slide: usize, total: usize, storage_key: &str) {
        let _ = (slide, total, storage_key);
    }

    /// Called once after every slide was published.
    fn on_job_complete(&self, slide_count: usize) {
        let _ = slide_count;
    }

    /// Called once when the job fails at any stage.
    ///
    /// # Arguments
    /// * `stage`: the [`crate::error::ErrorKind`] name, e.g. `"render"`
    /// * `error`: human-readable error description
    fn on_job_failed(&self, stage: &str, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        optimized: AtomicUsize,
        published: Mutex<Vec<String>>,
        failed_stage: Mutex<Option<String>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_slide_optimized(&self, _slide: usize, _total: usize, _bytes: usize, _floor: bool) {
            self.optimized.fetch_add(1, Ordering::SeqCst);
        }

        fn on_slide_published(&self, _slide: usize, _total: usize, storage_key: &str) {
            self.published.lock().unwrap().push(storage_key.to_string());
        }

        fn on_job_failed(&self, stage: &str, _error: &str) {
            *self.failed_stage.lock().unwrap() = Some(stage.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_job_start("job");
        cb.on_render_complete(5, 1200);
        cb.on_slide_optimized(1, 5, 1024, false);
        cb.on_slide_published(1, 5, "job/deck_slide_001.jpg");
        cb.on_job_complete(5);
        cb.on_job_failed("render", "timeout");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_slide_optimized(1, 2, 100, false);
        tracker.on_slide_published(1, 2, "job/deck_slide_001.jpg");
        tracker.on_slide_optimized(2, 2, 100, true);
        tracker.on_slide_published(2, 2, "job/deck_slide_002.jpg");
        tracker.on_job_failed("publish", "denied");

        assert_eq!(tracker.optimized.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.published.lock().unwrap().len(), 2);
        assert_eq!(tracker.failed_stage.lock().unwrap().as_deref(), Some("publish"));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_job_start("job");
        cb.on_job_complete(3);
    }
}
