//! Pipeline stages for presentation-to-JPEG conversion.
//!
//! Each submodule implements exactly one step and is usable on its own;
//! [`crate::convert::Converter`] chains them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ fetch ──▶ render ──▶ guard ──▶ optimize ──▶ publish
//! (JSON)   (GET)    (soffice,   (≤ 20)   (jpeg-encoder, (PUT)
//!                    pdfium)              Lanczos3)
//! ```
//!
//! 1. [`input`]    validate the payload, derive the job id and slide keys
//! 2. [`fetch`]    copy the source presentation into the job workspace
//! 3. [`render`]   presentation → PDF (subprocess) → one PNG per page (pdfium,
//!    `spawn_blocking`)
//! 4. [`guard`]    enforce the slide ceiling before any upload
//! 5. [`optimize`] shrink each raster below the byte budget; uses [`encode`]
//! 6. [`publish`]  write each JPEG under its deterministic key

pub mod encode;
pub mod fetch;
pub mod guard;
pub mod input;
pub mod optimize;
pub mod publish;
pub mod render;
