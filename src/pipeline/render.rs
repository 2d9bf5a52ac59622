//! Rendering: presentation → PDF → one raster file per page.
//!
//! Both steps are external collaborators behind traits:
//!
//! * [`DocumentRenderer`]: [`OfficeRenderer`] shells out to LibreOffice in
//!   headless mode. The subprocess gets a hard wall-clock limit
//!   ([`RENDER_TIMEOUT`]); when it fires the child's whole process group
//!   is killed, so helpers it forked do not outlive the job.
//! * [`Rasterizer`]: [`PdfiumRasterizer`] renders every PDF page at
//!   [`RASTER_DPI`] through pdfium and writes lossless PNGs.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state; it is not safe to call
//! from async contexts and rendering a 300 DPI page is CPU-heavy, so the
//! whole document is rasterised on the blocking pool.

use crate::config::{RASTER_DPI, RENDER_TIMEOUT};
use crate::error::ConvertError;
use async_trait::async_trait;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// One rasterised page on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 1-based position in the document.
    pub ordinal: usize,
    /// Raster file inside the job workspace.
    pub path: PathBuf,
}

/// Converts a source document into a fixed-layout PDF.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `source` into `out_dir` and return the produced PDF path.
    async fn render_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError>;
}

/// Converts a PDF into ordered raster pages.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Write one raster per page into `out_dir`, in page order.
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<RenderedPage>, ConvertError>;
}

/// Render `source` to PDF, then rasterise it into `<workspace>/pages/`.
pub async fn render_document(
    renderer: &dyn DocumentRenderer,
    rasterizer: &dyn Rasterizer,
    source: &Path,
    workspace: &Path,
) -> Result<Vec<RenderedPage>, ConvertError> {
    let start = Instant::now();
    let pdf = renderer.render_to_pdf(source, workspace).await?;
    info!("Rendered PDF in {}ms: {}", start.elapsed().as_millis(), pdf.display());

    let pages_dir = workspace.join("pages");
    tokio::fs::create_dir_all(&pages_dir)
        .await
        .map_err(|e| ConvertError::render(format!("failed to create page directory: {e}")))?;

    let pages = rasterizer.rasterize(&pdf, &pages_dir).await?;
    ensure_ordered(&pages)?;
    info!("Rasterised {} pages", pages.len());

    Ok(pages)
}

/// Ordinals must be exactly `1..=n` in emission order.
pub fn ensure_ordered(pages: &[RenderedPage]) -> Result<(), ConvertError> {
    for (idx, page) in pages.iter().enumerate() {
        if page.ordinal != idx + 1 {
            return Err(ConvertError::render(format!(
                "rasterizer emitted page {} at position {}",
                page.ordinal,
                idx + 1
            )));
        }
    }
    Ok(())
}

// ── LibreOffice ──────────────────────────────────────────────────────────

/// Headless LibreOffice (`soffice --convert-to pdf`).
#[derive(Debug, Clone)]
pub struct OfficeRenderer {
    binary: PathBuf,
    timeout: Duration,
}

impl OfficeRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: RENDER_TIMEOUT,
        }
    }

    /// Override the wall-clock limit. Jobs run by [`crate::Converter`]
    /// always use [`RENDER_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl DocumentRenderer for OfficeRenderer {
    async fn render_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        // A per-job profile keeps concurrent invocations from fighting over
        // the shared user installation lock; it is removed with the workspace.
        let profile = profile_url(out_dir)?;

        let mut command = Command::new(&self.binary);
        command
            .arg(format!("-env:UserInstallation={profile}"))
            .args([
                "--headless",
                "--invisible",
                "--nodefault",
                "--nofirststartwizard",
                "--nolockcheck",
                "--nologo",
                "--norestore",
                "--convert-to",
                "pdf",
                "--outdir",
            ])
            .arg(out_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // soffice forks oosplash and soffice.bin; give them their own group
        // so a timeout can take all of them down.
        #[cfg(unix)]
        command.process_group(0);

        debug!("Running {:?}", command.as_std());

        let child = command.spawn().map_err(|e| {
            ConvertError::render(format!(
                "failed to start '{}': {e}",
                self.binary.display()
            ))
        })?;

        let pid = child.id();

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| ConvertError::render(format!("failed to wait for renderer: {e}")))?,
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                warn!("Office renderer exceeded {:?}, killed", self.timeout);
                return Err(ConvertError::render(timeout_message(self.timeout)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(ConvertError::render(format!(
                "office renderer exited with {}: {}",
                output.status, diagnostic
            )));
        }

        let stem = source
            .file_stem()
            .ok_or_else(|| ConvertError::render("source document has no file name"))?;
        let mut pdf_name = stem.to_os_string();
        pdf_name.push(".pdf");
        let pdf = out_dir.join(pdf_name);

        if !pdf.is_file() {
            return Err(ConvertError::render(format!(
                "output not produced: expected {}",
                pdf.display()
            )));
        }

        Ok(pdf)
    }
}

/// `file://` URL of the per-job office profile under `out_dir`, absolute
/// and percent-encoded.
fn profile_url(out_dir: &Path) -> Result<String, ConvertError> {
    let profile = std::path::absolute(out_dir.join(".office-profile"))
        .map_err(|e| ConvertError::render(format!("failed to resolve profile directory: {e}")))?;
    let url = url::Url::from_file_path(&profile).map_err(|()| {
        ConvertError::render(format!(
            "profile directory is not a valid file URL: {}",
            profile.display()
        ))
    })?;
    Ok(url.into())
}

fn timeout_message(timeout: Duration) -> String {
    format!("conversion timeout ({} seconds)", timeout.as_secs_f64())
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg takes no pointers; a stale group id only yields ESRCH.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "killpg({pgid}) failed: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

// ── pdfium ───────────────────────────────────────────────────────────────

/// pdfium-backed rasterizer writing `slide_NNN.png` files.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
    dpi: u32,
}

impl PdfiumRasterizer {
    /// `library_dir` holds the platform pdfium library; `None` binds the
    /// system-installed one.
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self {
            library_dir,
            dpi: RASTER_DPI,
        }
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<RenderedPage>, ConvertError> {
        let pdf = pdf.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        let library_dir = self.library_dir.clone();
        let dpi = self.dpi;

        tokio::task::spawn_blocking(move || {
            rasterize_blocking(&pdf, &out_dir, library_dir.as_deref(), dpi)
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("Rasterise task panicked: {}", e)))?
    }
}

fn bind_pdfium(library_dir: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let bindings = match library_dir {
        Some(dir) => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ConvertError::render(format!("failed to bind pdfium: {:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rasterisation.
fn rasterize_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    library_dir: Option<&Path>,
    dpi: u32,
) -> Result<Vec<RenderedPage>, ConvertError> {
    let pdfium = bind_pdfium(library_dir)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ConvertError::render(format!("failed to open PDF: {:?}", e)))?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    // PDF user space is 72 units per inch.
    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

    let mut results = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let ordinal = idx + 1;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ConvertError::render(format!("rasterisation failed for page {ordinal}: {:?}", e))
        })?;

        let image = bitmap.as_image();
        let path = out_dir.join(format!("slide_{:03}.png", ordinal));
        image.save_with_format(&path, ImageFormat::Png).map_err(|e| {
            ConvertError::render(format!("failed to write page {ordinal}: {e}"))
        })?;

        debug!(
            "Rasterised page {} → {}x{} px",
            ordinal,
            image.width(),
            image.height()
        );

        results.push(RenderedPage { ordinal, path });
    }

    Ok(results)
}
