//! Input resolution: validate the invocation payload and derive the job.
//!
//! The payload arrives as loosely-typed JSON (Lambda event, CLI flags), so
//! every field is optional at the type level and [`ConversionRequest::validate`]
//! turns missing values into a [`ConvertError::Validation`] instead of a
//! deserialisation failure. Validation has no side effects and runs before
//! any workspace is allocated.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw invocation payload.
///
/// The field names of the earlier deployment (`bucketName`, `fileKey`,
/// `fileName`) are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Storage location (bucket) holding the source and receiving the slides.
    #[serde(default, alias = "bucketName")]
    pub storage_location: Option<String>,

    /// Object key of the source presentation, `"{jobId}/…"`.
    #[serde(default, alias = "fileKey")]
    pub source_key: Option<String>,

    /// Original file name of the presentation, e.g. `"deck.pptx"`.
    #[serde(default, alias = "fileName")]
    pub source_file_name: Option<String>,
}

impl ConversionRequest {
    pub fn new(
        storage_location: impl Into<String>,
        source_key: impl Into<String>,
        source_file_name: impl Into<String>,
    ) -> Self {
        Self {
            storage_location: Some(storage_location.into()),
            source_key: Some(source_key.into()),
            source_file_name: Some(source_file_name.into()),
        }
    }

    /// Check required fields and derive the [`Job`].
    pub fn validate(&self) -> Result<Job, ConvertError> {
        let storage_location = required(&self.storage_location, "storageLocation")?;
        let source_key = required(&self.source_key, "sourceKey")?;
        let source_file_name = required(&self.source_file_name, "sourceFileName")?;

        let (job_id, _) = source_key.split_once('/').ok_or_else(|| {
            ConvertError::Validation(format!(
                "sourceKey '{source_key}' has no path separator to derive a job id from"
            ))
        })?;
        if job_id.is_empty() {
            return Err(ConvertError::Validation(format!(
                "sourceKey '{source_key}' starts with a separator; job id would be empty"
            )));
        }

        if source_file_name.contains(['/', '\\'])
            || source_file_name == "."
            || source_file_name == ".."
        {
            return Err(ConvertError::Validation(format!(
                "sourceFileName '{source_file_name}' must be a plain file name"
            )));
        }

        Ok(Job {
            job_id: job_id.to_string(),
            storage_location: storage_location.to_string(),
            source_key: source_key.to_string(),
            source_file_name: source_file_name.to_string(),
        })
    }
}

/// Blank values are missing; anything else is returned exactly as given,
/// since object keys may legally carry surrounding whitespace.
fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ConvertError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConvertError::Validation(format!("{field} is required"))),
    }
}

/// A validated conversion job. Lives for one invocation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// First path segment of `source_key`; prefixes every published key.
    pub job_id: String,
    pub storage_location: String,
    pub source_key: String,
    pub source_file_name: String,
}

impl Job {
    /// File name without its extension: `"deck.pptx"` → `"deck"`.
    pub fn base_name(&self) -> &str {
        Path::new(&self.source_file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.source_file_name)
    }

    /// `"{base}_slide_{ordinal:03}.jpg"`.
    pub fn slide_file_name(&self, ordinal: usize) -> String {
        format!("{}_slide_{:03}.jpg", self.base_name(), ordinal)
    }

    /// `"{jobId}/{base}_slide_{ordinal:03}.jpg"`, identical across runs.
    pub fn slide_key(&self, ordinal: usize) -> String {
        format!("{}/{}", self.job_id, self.slide_file_name(ordinal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        ConversionRequest::new("bucket", "3f9c/deck.pptx", "deck.pptx")
            .validate()
            .unwrap()
    }

    #[test]
    fn derives_job_id_from_first_segment() {
        let j = ConversionRequest::new("bucket", "abc/nested/deck.pptx", "deck.pptx")
            .validate()
            .unwrap();
        assert_eq!(j.job_id, "abc");
        assert_eq!(j.storage_location, "bucket");
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let cases = [
            (ConversionRequest::default(), "storageLocation"),
            (
                ConversionRequest {
                    source_key: None,
                    ..ConversionRequest::new("b", "j/d.pptx", "d.pptx")
                },
                "sourceKey",
            ),
            (
                ConversionRequest {
                    source_file_name: Some("  ".into()),
                    ..ConversionRequest::new("b", "j/d.pptx", "d.pptx")
                },
                "sourceFileName",
            ),
        ];
        for (request, field) in cases {
            let err = request.validate().unwrap_err();
            assert!(matches!(err, ConvertError::Validation(_)));
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn values_are_kept_verbatim() {
        let j = ConversionRequest::new(" bucket ", " abc/deck.pptx", "deck.pptx ")
            .validate()
            .unwrap();
        assert_eq!(j.storage_location, " bucket ");
        assert_eq!(j.source_key, " abc/deck.pptx");
        assert_eq!(j.source_file_name, "deck.pptx ");
        assert_eq!(j.job_id, " abc");
    }

    #[test]
    fn key_without_separator_rejected() {
        let err = ConversionRequest::new("b", "deck.pptx", "deck.pptx")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("separator"));

        let err = ConversionRequest::new("b", "/deck.pptx", "deck.pptx")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn file_name_must_be_plain() {
        for name in ["../deck.pptx", "a/b.pptx", "a\\b.pptx", ".."] {
            let err = ConversionRequest::new("b", "j/deck.pptx", name)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ConvertError::Validation(_)), "{name}");
        }
    }

    #[test]
    fn deterministic_slide_keys() {
        let j = job();
        assert_eq!(j.base_name(), "deck");
        assert_eq!(j.slide_file_name(1), "deck_slide_001.jpg");
        assert_eq!(j.slide_key(12), "3f9c/deck_slide_012.jpg");
        assert_eq!(job().slide_key(5), j.slide_key(5));
    }

    #[test]
    fn base_name_keeps_inner_dots() {
        let j = ConversionRequest::new("b", "j/x", "q3.review.pptx")
            .validate()
            .unwrap();
        assert_eq!(j.base_name(), "q3.review");
    }

    #[test]
    fn accepts_legacy_field_names() {
        let json = r#"{"bucketName":"b","fileKey":"id/deck.pptx","fileName":"deck.pptx"}"#;
        let request: ConversionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request, ConversionRequest::new("b", "id/deck.pptx", "deck.pptx"));

        let json = r#"{"storageLocation":"b","sourceKey":"id/deck.pptx"}"#;
        let request: ConversionRequest = serde_json::from_str(json).unwrap();
        assert!(request.source_file_name.is_none());
    }
}
