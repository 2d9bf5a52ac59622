//! Size-constrained JPEG optimisation.
//!
//! Every slide must fit in [`MAX_IMAGE_SIZE`] bytes. The optimizer tries the
//! cheapest degradation first:
//!
//! ```text
//! quality phase   q = 95, 90, …, 55 at full resolution
//! resize phase    scale = 0.9, 0.81, …  (Lanczos3 from the full-size raster, q = 85)
//! floor           next scale < 0.3 → return the last buffer, oversized
//! ```
//!
//! The schedule is deterministic, so identical rasters always produce
//! identical bytes. The floor guarantees termination; a slide that hits it
//! is published anyway and flagged with [`OptimizedImage::floor_reached`].

use super::encode::{encode_jpeg, EncodeError};
use super::render::RenderedPage;
use crate::config::{
    INITIAL_QUALITY, MAX_IMAGE_SIZE, MIN_SCALE, QUALITY_FLOOR, QUALITY_STEP, RESIZE_QUALITY,
    SCALE_STEP,
};
use crate::error::ConvertError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use std::path::Path;
use tracing::{debug, warn};

/// One encode performed while searching for a small enough buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attempt {
    /// Full resolution at a reduced quality.
    Quality { quality: u8, bytes: usize },
    /// Downscaled copy of the full-size raster at [`RESIZE_QUALITY`].
    Resize {
        scale: f64,
        width: u32,
        height: u32,
        bytes: usize,
    },
}

impl Attempt {
    pub fn bytes(&self) -> usize {
        match self {
            Attempt::Quality { bytes, .. } | Attempt::Resize { bytes, .. } => *bytes,
        }
    }
}

/// The JPEG chosen for one slide.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    /// 1-based slide number.
    pub ordinal: usize,
    /// Encoded JPEG.
    pub bytes: Vec<u8>,
    /// Quality the returned buffer was encoded at.
    pub quality: u8,
    /// Scale of the returned buffer relative to the raster (1.0 = untouched).
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    /// The next scale would have dropped below the floor; `bytes` may
    /// exceed the budget.
    pub floor_reached: bool,
    /// Every encode in the order performed; the last one produced `bytes`.
    pub attempts: Vec<Attempt>,
}

impl OptimizedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Shrinks rasters until they fit a byte budget.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptimizer {
    max_bytes: usize,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl ImageOptimizer {
    /// Optimizer with the production budget ([`MAX_IMAGE_SIZE`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimizer with a custom budget, for library callers and tests.
    pub fn with_budget(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Optimize a rendered page on the blocking pool.
    pub async fn optimize_page(&self, page: &RenderedPage) -> Result<OptimizedImage, ConvertError> {
        let optimizer = *self;
        let ordinal = page.ordinal;
        let path = page.path.clone();

        tokio::task::spawn_blocking(move || optimizer.optimize_file(ordinal, &path))
            .await
            .map_err(|e| ConvertError::Internal(format!("Optimize task panicked: {}", e)))?
    }

    /// Decode the raster at `path` and optimize it.
    pub fn optimize_file(&self, ordinal: usize, path: &Path) -> Result<OptimizedImage, ConvertError> {
        let image = image::open(path).map_err(|e| ConvertError::Optimization {
            slide: ordinal,
            detail: format!("cannot decode {}: {e}", path.display()),
        })?;
        self.optimize_image(ordinal, &image)
    }

    /// Run the quality phase, then the resize phase, on an in-memory image.
    pub fn optimize_image(
        &self,
        ordinal: usize,
        image: &DynamicImage,
    ) -> Result<OptimizedImage, ConvertError> {
        let codec_error = |e: EncodeError| ConvertError::Optimization {
            slide: ordinal,
            detail: e.to_string(),
        };

        // Alpha, greyscale and 16-bit rasters all become opaque 8-bit RGB.
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut attempts = Vec::new();

        let mut quality = INITIAL_QUALITY;
        while quality > QUALITY_FLOOR {
            let bytes = encode_jpeg(&rgb, quality).map_err(codec_error)?;
            debug!("Slide {}: q{} → {} bytes", ordinal, quality, bytes.len());
            attempts.push(Attempt::Quality {
                quality,
                bytes: bytes.len(),
            });

            if bytes.len() <= self.max_bytes {
                return Ok(OptimizedImage {
                    ordinal,
                    bytes,
                    quality,
                    scale: 1.0,
                    width,
                    height,
                    floor_reached: false,
                    attempts,
                });
            }
            quality -= QUALITY_STEP;
        }

        let mut scale = SCALE_STEP;
        loop {
            let (w, h) = scaled_dimensions(width, height, scale);
            let resized: RgbImage = imageops::resize(&rgb, w, h, FilterType::Lanczos3);
            let bytes = encode_jpeg(&resized, RESIZE_QUALITY).map_err(codec_error)?;
            debug!(
                "Slide {}: scale {:.3} ({}x{}) → {} bytes",
                ordinal,
                scale,
                w,
                h,
                bytes.len()
            );
            attempts.push(Attempt::Resize {
                scale,
                width: w,
                height: h,
                bytes: bytes.len(),
            });

            let within_budget = bytes.len() <= self.max_bytes;
            let next = scale * SCALE_STEP;
            let floor_reached = !within_budget && next < MIN_SCALE;

            if within_budget || floor_reached {
                if floor_reached {
                    warn!(
                        "Slide {}: still {} bytes at scale {:.3}; publishing over the {} byte budget",
                        ordinal,
                        bytes.len(),
                        scale,
                        self.max_bytes
                    );
                }
                return Ok(OptimizedImage {
                    ordinal,
                    bytes,
                    quality: RESIZE_QUALITY,
                    scale,
                    width: w,
                    height: h,
                    floor_reached,
                    attempts,
                });
            }
            scale = next;
        }
    }
}

/// `floor(dimension × scale)`, never below one pixel.
fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale).floor() as u32;
    let h = (height as f64 * scale).floor() as u32;
    (w.max(1), h.max(1))
}
