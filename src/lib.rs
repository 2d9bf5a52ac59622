//! # pptx2jpeg
//!
//! Convert a slide presentation stored in object storage into one JPEG per
//! slide, each below a fixed byte budget, and publish the images back to the
//! same storage under deterministic keys.
//!
//! ## Pipeline Overview
//!
//! ```text
//! {storageLocation, sourceKey, sourceFileName}
//!  │
//!  ├─ 1. Input     validate, derive job id = first segment of sourceKey
//!  ├─ 2. Fetch     GET the presentation into a scoped temp workspace
//!  ├─ 3. Render    soffice --convert-to pdf (120 s timeout), pdfium @ 300 DPI
//!  ├─ 4. Guard     more than 20 pages → 400, nothing uploaded
//!  ├─ 5. Optimize  q95→q55, then Lanczos downscale ×0.9 at q85, floor 0.3
//!  ├─ 6. Publish   PUT {jobId}/{base}_slide_{nnn}.jpg
//!  └─ 7. Respond   {statusCode, body}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pptx2jpeg::{ConversionConfig, ConversionRequest, Converter, S3Storage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(S3Storage::from_env().await);
//!     let converter = Converter::from_config(storage, ConversionConfig::default());
//!
//!     let request = ConversionRequest::new("my-bucket", "3f9c/deck.pptx", "deck.pptx");
//!     let response = converter.handle(request).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | `pptx2jpeg` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `lambda` | off     | `pptx2jpeg-lambda` binary on `lambda_runtime` |
//!
//! ## External requirements
//!
//! LibreOffice (`soffice`) on `PATH` or configured via
//! [`ConversionConfigBuilder::office_binary`], and the pdfium shared library
//! in the system library path or [`ConversionConfigBuilder::pdfium_library_dir`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod response;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, Locale};
pub use convert::Converter;
pub use error::{ConvertError, ErrorKind, StorageError};
pub use output::{ConversionOutput, ConversionStats, PublishedSlide};
pub use pipeline::input::{ConversionRequest, Job};
pub use pipeline::optimize::{ImageOptimizer, OptimizedImage};
pub use pipeline::render::{
    DocumentRenderer, OfficeRenderer, PdfiumRasterizer, Rasterizer, RenderedPage,
};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use response::{ConversionResponse, EncodedResponse, ResponseBody};
pub use storage::{LocalStorage, MemoryStorage, ObjectStorage, S3Storage};
