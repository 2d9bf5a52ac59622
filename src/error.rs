//! Error types for the pptx2jpeg library.
//!
//! Two layers of errors exist:
//!
//! * [`ConvertError`] (**job-level**): one variant per pipeline stage. Every
//!   failure is terminal for the job; nothing is retried. The variant decides
//!   the response status (see [`ConvertError::status_code`]).
//!
//! * [`StorageError`]: returned by [`crate::storage::ObjectStorage`]
//!   backends. The pipeline wraps it into [`ConvertError::Fetch`] or
//!   [`ConvertError::Publish`] depending on the stage that failed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All job-level errors returned by the conversion pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The invocation payload is missing a field or a field is malformed.
    #[error("Invalid request: {0}")]
    Validation(String),

    // ── Storage errors ────────────────────────────────────────────────────
    /// The source document could not be retrieved into the workspace.
    #[error("Failed to fetch '{key}' from '{location}': {source}")]
    Fetch {
        location: String,
        key: String,
        #[source]
        source: StorageError,
    },

    /// An optimized slide could not be written to storage.
    #[error("Failed to publish slide {slide} to '{key}': {source}")]
    Publish {
        slide: usize,
        key: String,
        #[source]
        source: StorageError,
    },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The office renderer or the rasterizer failed.
    #[error("Rendering failed: {0}")]
    Render(String),

    /// The rendered document has more pages than the job allows.
    #[error("Document has {count} pages, the limit is {max}")]
    TooManyPages { count: usize, max: usize },

    // ── Image errors ──────────────────────────────────────────────────────
    /// Decoding the raster or encoding the JPEG failed.
    #[error("Image optimization failed for slide {slide}: {detail}")]
    Optimization { slide: usize, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Workspace creation, blocking-task join and similar plumbing failures.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Validation(_) => ErrorKind::Validation,
            ConvertError::Fetch { .. } => ErrorKind::Fetch,
            ConvertError::Publish { .. } => ErrorKind::Publish,
            ConvertError::Render(_) => ErrorKind::Render,
            ConvertError::TooManyPages { .. } => ErrorKind::TooManyPages,
            ConvertError::Optimization { .. } => ErrorKind::Optimization,
            ConvertError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP-style status used in the response envelope.
    ///
    /// Only the page-limit rule is a client error; everything else is 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ConvertError::TooManyPages { .. } => 400,
            _ => 500,
        }
    }

    /// Shorthand for the render stage, which reports plain strings.
    pub(crate) fn render(detail: impl Into<String>) -> Self {
        ConvertError::Render(detail.into())
    }
}

/// Stable, serialisable name for each [`ConvertError`] variant.
///
/// Emitted as `errorKind` in failure envelopes and as the `stage` field in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Fetch,
    Render,
    TooManyPages,
    Optimization,
    Publish,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Render => "render",
            ErrorKind::TooManyPages => "too_many_pages",
            ErrorKind::Optimization => "optimization",
            ErrorKind::Publish => "publish",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by object storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object (or its location) does not exist.
    #[error("Object not found: {location}/{key}")]
    NotFound { location: String, key: String },

    /// The backend service rejected or failed the request.
    #[error("Storage service error: {0}")]
    Service(String),

    /// Local file-system backed storage failed.
    #[error("Storage I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The location or key cannot be mapped onto this backend.
    #[error("Invalid object address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_pages_is_client_error() {
        let e = ConvertError::TooManyPages { count: 25, max: 20 };
        assert_eq!(e.status_code(), 400);
        assert_eq!(e.kind(), ErrorKind::TooManyPages);
        let msg = e.to_string();
        assert!(msg.contains("25"), "got: {msg}");
        assert!(msg.contains("20"), "got: {msg}");
    }

    #[test]
    fn other_errors_are_server_errors() {
        let errors = [
            ConvertError::Validation("sourceKey is required".into()),
            ConvertError::render("timeout (120 seconds)"),
            ConvertError::Optimization {
                slide: 3,
                detail: "bad header".into(),
            },
            ConvertError::Internal("join".into()),
        ];
        for e in errors {
            assert_eq!(e.status_code(), 500, "{e}");
        }
    }

    #[test]
    fn fetch_display_includes_source() {
        let e = ConvertError::Fetch {
            location: "bucket".into(),
            key: "job/deck.pptx".into(),
            source: StorageError::NotFound {
                location: "bucket".into(),
                key: "job/deck.pptx".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("job/deck.pptx"));
        assert!(msg.contains("not found"), "got: {msg}");
        assert_eq!(e.kind().as_str(), "fetch");
    }

    #[test]
    fn error_kind_serialises_snake_case() {
        let json = serde_json::to_string(&ErrorKind::TooManyPages).unwrap();
        assert_eq!(json, "\"too_many_pages\"");
        assert_eq!(ErrorKind::TooManyPages.to_string(), "too_many_pages");
    }
}
