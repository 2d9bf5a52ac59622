//! Configuration for presentation-to-JPEG conversion.
//!
//! Business limits (page ceiling, byte budget, render timeout, DPI, the
//! optimizer's quality/scale schedule) are compile-time constants: they are
//! part of the output contract and are not meant to drift between
//! deployments. [`ConversionConfig`] only carries environment plumbing:
//! where the office binary and pdfium live, where the scratch workspace is
//! created, which locale the response messages use, and an optional
//! progress callback.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ── Limits ───────────────────────────────────────────────────────────────

/// Maximum number of rendered pages a job may publish.
pub const MAX_SLIDES: usize = 20;

/// Byte budget for every published JPEG.
pub const MAX_IMAGE_SIZE: usize = 3_750_000;

/// Wall-clock limit for the office renderer subprocess.
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Rasterisation resolution.
pub const RASTER_DPI: u32 = 300;

/// First JPEG quality tried by the optimizer.
pub const INITIAL_QUALITY: u8 = 95;

/// Quality decrement between attempts.
pub const QUALITY_STEP: u8 = 5;

/// The quality phase stops before reaching this value.
pub const QUALITY_FLOOR: u8 = 50;

/// Fixed quality used once the optimizer starts resizing.
pub const RESIZE_QUALITY: u8 = 85;

/// First and multiplicative scale step of the resize phase.
pub const SCALE_STEP: f64 = 0.9;

/// Degradation floor: resizing stops once the scale drops below this.
pub const MIN_SCALE: f64 = 0.3;

/// Default office renderer executable, resolved through `PATH`.
pub const DEFAULT_OFFICE_BINARY: &str = "soffice";

// ── Config ───────────────────────────────────────────────────────────────

/// Configuration for a [`crate::Converter`].
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pptx2jpeg::{ConversionConfig, Locale};
///
/// let config = ConversionConfig::builder()
///     .office_binary("/opt/bin/soffice")
///     .locale(Locale::Ja)
///     .build()
///     .unwrap();
/// assert_eq!(config.office_binary.to_str(), Some("/opt/bin/soffice"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Path (or `PATH`-resolvable name) of the LibreOffice `soffice` binary.
    pub office_binary: PathBuf,

    /// Directory containing the pdfium shared library.
    ///
    /// When `None` the rasterizer binds to the system library.
    pub pdfium_library_dir: Option<PathBuf>,

    /// Parent directory for per-job workspaces. Default: the OS temp dir.
    pub workspace_root: Option<PathBuf>,

    /// Language of the human-readable error messages in responses.
    pub locale: Locale,

    /// Per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            office_binary: PathBuf::from(DEFAULT_OFFICE_BINARY),
            pdfium_library_dir: None,
            workspace_root: None,
            locale: Locale::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("office_binary", &self.office_binary)
            .field("pdfium_library_dir", &self.pdfium_library_dir)
            .field("workspace_root", &self.workspace_root)
            .field("locale", &self.locale)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn office_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.office_binary = path.into();
        self
    }

    pub fn pdfium_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_dir = Some(dir.into());
        self
    }

    pub fn workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace_root = Some(dir.into());
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.office_binary.as_os_str().is_empty() {
            return Err(ConvertError::Validation(
                "office binary path must not be empty".into(),
            ));
        }
        if let Some(ref root) = c.workspace_root {
            if !root.is_dir() {
                return Err(ConvertError::Validation(format!(
                    "workspace root '{}' is not a directory",
                    root.display()
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Language used for the `error` message in failure responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Japanese.
    Ja,
}

impl Locale {
    /// Message for a document that exceeds the page ceiling.
    pub fn too_many_slides(&self, max: usize, count: usize) -> String {
        match self {
            Locale::En => format!(
                "The presentation has more than {max} slides ({count} slides)."
            ),
            Locale::Ja => format!(
                "PowerPointのスライド数が{max}枚を超えています。（{count}枚）"
            ),
        }
    }

    /// Message for any other failure, embedding the root cause.
    pub fn conversion_failed(&self, cause: &str) -> String {
        match self {
            Locale::En => format!("An error occurred during conversion: {cause}"),
            Locale::Ja => format!("変換中にエラーが発生しました: {cause}"),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ja" | "jp" | "japanese" => Ok(Locale::Ja),
            other => Err(format!("unsupported locale '{other}' (expected en or ja)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.office_binary, PathBuf::from("soffice"));
        assert!(c.pdfium_library_dir.is_none());
        assert_eq!(c.locale, Locale::En);
    }

    #[test]
    fn empty_office_binary_rejected() {
        let err = ConversionConfig::builder().office_binary("").build().unwrap_err();
        assert!(err.to_string().contains("office binary"));
    }

    #[test]
    fn missing_workspace_root_rejected() {
        let err = ConversionConfig::builder()
            .workspace_root("/definitely/not/a/real/dir")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("workspace root"));
    }

    #[test]
    fn locale_messages_embed_limit_and_count() {
        for locale in [Locale::En, Locale::Ja] {
            let msg = locale.too_many_slides(MAX_SLIDES, 25);
            assert!(msg.contains("20"), "{msg}");
            assert!(msg.contains("25"), "{msg}");
        }
        assert!(Locale::Ja.conversion_failed("boom").ends_with("boom"));
    }

    #[test]
    fn locale_parse() {
        assert_eq!("JA".parse::<Locale>().unwrap(), Locale::Ja);
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn quality_schedule_constants() {
        // 95, 90, …, 55: nine attempts before the resize phase
        let attempts = (QUALITY_FLOOR + 1..=INITIAL_QUALITY)
            .rev()
            .step_by(QUALITY_STEP as usize)
            .count();
        assert_eq!(attempts, 9);
    }
}
