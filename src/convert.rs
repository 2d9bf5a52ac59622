//! Job orchestration: request → workspace → slides in storage → envelope.
//!
//! A [`Converter`] owns its collaborators behind trait objects so that the
//! same pipeline drives S3 + LibreOffice + pdfium in production and
//! in-memory fakes in tests. One `convert` call is one job; jobs are
//! independent and share nothing but the collaborators.
//!
//! ## Stage order
//!
//! ```text
//! validate ─▶ workspace ─▶ fetch ─▶ render ─▶ guard ─▶ ┬─ optimize slide 1 ─▶ publish slide 1
//!                                                      ├─ optimize slide 2 ─▶ publish slide 2
//!                                                      └─ …
//! ```
//!
//! The first failing stage ends the job. Slides already published stay in
//! storage. The workspace is deleted on every exit path.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::fetch::fetch_source;
use crate::pipeline::guard::check_page_count;
use crate::pipeline::input::{ConversionRequest, Job};
use crate::pipeline::optimize::ImageOptimizer;
use crate::pipeline::publish::publish_slide;
use crate::pipeline::render::{
    render_document, DocumentRenderer, OfficeRenderer, PdfiumRasterizer, Rasterizer,
};
use crate::response::ConversionResponse;
use crate::storage::ObjectStorage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{error, info, info_span, warn, Instrument};

const WORKSPACE_PREFIX: &str = "pptx2jpeg-";

/// Runs conversion jobs against one storage backend and renderer pair.
pub struct Converter {
    storage: Arc<dyn ObjectStorage>,
    renderer: Arc<dyn DocumentRenderer>,
    rasterizer: Arc<dyn Rasterizer>,
    optimizer: ImageOptimizer,
    config: ConversionConfig,
}

impl Converter {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        renderer: Arc<dyn DocumentRenderer>,
        rasterizer: Arc<dyn Rasterizer>,
        config: ConversionConfig,
    ) -> Self {
        Self {
            storage,
            renderer,
            rasterizer,
            optimizer: ImageOptimizer::new(),
            config,
        }
    }

    /// Production wiring: `soffice` from `config.office_binary` and pdfium
    /// from `config.pdfium_library_dir`.
    pub fn from_config(storage: Arc<dyn ObjectStorage>, config: ConversionConfig) -> Self {
        let renderer = Arc::new(OfficeRenderer::new(config.office_binary.clone()));
        let rasterizer = Arc::new(PdfiumRasterizer::new(config.pdfium_library_dir.clone()));
        Self::new(storage, renderer, rasterizer, config)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Run one job and return the published slides.
    ///
    /// # Errors
    /// The first failing stage's [`ConvertError`]. Validation errors are
    /// returned before any workspace exists or storage is touched.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionOutput, ConvertError> {
        let job = match request.validate() {
            Ok(job) => job,
            Err(e) => {
                self.notify_failed(&e);
                return Err(e);
            }
        };

        let span = info_span!("job", job_id = %job.job_id);
        async {
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_job_start(&job.job_id);
            }

            let workspace = match self.create_workspace() {
                Ok(dir) => dir,
                Err(e) => {
                    self.notify_failed(&e);
                    return Err(e);
                }
            };
            let result = self.run(&job, workspace.path()).await;

            let path = workspace.path().to_path_buf();
            if let Err(e) = workspace.close() {
                warn!("Failed to remove workspace {}: {}", path.display(), e);
            }

            if let Err(ref e) = result {
                self.notify_failed(e);
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Run one job and map the outcome to the response envelope.
    ///
    /// Never fails: every error becomes a 400/500 envelope, logged with the
    /// job id and the stage that failed.
    pub async fn handle(&self, request: ConversionRequest) -> ConversionResponse {
        let result = self.convert(&request).await;
        if let Err(ref e) = result {
            error!(
                job_id = job_id_hint(&request),
                stage = e.kind().as_str(),
                "Conversion failed: {}",
                e
            );
        }
        ConversionResponse::from_result(&result, self.config.locale)
    }

    async fn run(&self, job: &Job, workspace: &Path) -> Result<ConversionOutput, ConvertError> {
        let total_start = Instant::now();
        info!("Starting conversion of {}/{}", job.storage_location, job.source_key);

        // ── Fetch ────────────────────────────────────────────────────────────
        let source = fetch_source(self.storage.as_ref(), job, workspace).await?;

        // ── Render ───────────────────────────────────────────────────────────
        let render_start = Instant::now();
        let pages = render_document(
            self.renderer.as_ref(),
            self.rasterizer.as_ref(),
            &source,
            workspace,
        )
        .await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        info!("Rendered {} pages in {}ms", pages.len(), render_duration_ms);

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_render_complete(pages.len(), render_duration_ms);
        }

        // ── Guard ────────────────────────────────────────────────────────────
        check_page_count(pages.len())?;

        // ── Optimize + publish, one slide at a time ──────────────────────────
        let total = pages.len();
        let mut stats = ConversionStats {
            render_duration_ms,
            ..ConversionStats::default()
        };
        let mut images = Vec::with_capacity(total);

        for page in &pages {
            let started = Instant::now();
            let optimized = self.optimizer.optimize_page(page).await?;
            stats.optimize_duration_ms += started.elapsed().as_millis() as u64;

            if let Some(ref cb) = self.config.progress_callback {
                cb.on_slide_optimized(page.ordinal, total, optimized.len(), optimized.floor_reached);
            }

            let started = Instant::now();
            let published = publish_slide(self.storage.as_ref(), job, &optimized).await?;
            stats.publish_duration_ms += started.elapsed().as_millis() as u64;
            stats.uploaded_bytes += published.size_bytes as u64;
            if published.floor_reached {
                stats.degraded_slides += 1;
            }

            if let Some(ref cb) = self.config.progress_callback {
                cb.on_slide_published(page.ordinal, total, &published.storage_key);
            }
            images.push(published);
        }

        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        info!(
            "Conversion complete: {} slides, {} bytes uploaded, {}ms total",
            images.len(),
            stats.uploaded_bytes,
            stats.total_duration_ms
        );
        if stats.degraded_slides > 0 {
            warn!("{} slides exceed the size budget", stats.degraded_slides);
        }

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_job_complete(images.len());
        }

        Ok(ConversionOutput {
            job_id: job.job_id.clone(),
            slide_count: images.len(),
            images,
            stats,
        })
    }

    fn create_workspace(&self) -> Result<TempDir, ConvertError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match self.config.workspace_root {
            Some(ref root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| ConvertError::Internal(format!("Cannot create workspace: {}", e)))
    }

    fn notify_failed(&self, e: &ConvertError) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_job_failed(e.kind().as_str(), &e.to_string());
        }
    }
}

/// Best-effort job id for logging, available even when validation failed.
fn job_id_hint(request: &ConversionRequest) -> &str {
    request
        .source_key
        .as_deref()
        .and_then(|key| key.split_once('/'))
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
        .unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::RenderedPage;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct Unreachable;

    #[async_trait]
    impl DocumentRenderer for Unreachable {
        async fn render_to_pdf(&self, _: &Path, _: &Path) -> Result<PathBuf, ConvertError> {
            panic!("renderer must not run");
        }
    }

    #[async_trait]
    impl Rasterizer for Unreachable {
        async fn rasterize(&self, _: &Path, _: &Path) -> Result<Vec<RenderedPage>, ConvertError> {
            panic!("rasterizer must not run");
        }
    }

    fn converter(storage: Arc<MemoryStorage>, config: ConversionConfig) -> Converter {
        Converter::new(storage, Arc::new(Unreachable), Arc::new(Unreachable), config)
    }

    #[test]
    fn job_id_hint_falls_back() {
        let ok = ConversionRequest::new("b", "abc/deck.pptx", "deck.pptx");
        assert_eq!(job_id_hint(&ok), "abc");
        assert_eq!(job_id_hint(&ConversionRequest::default()), "-");
        let bad = ConversionRequest::new("b", "/deck.pptx", "deck.pptx");
        assert_eq!(job_id_hint(&bad), "-");
    }

    #[tokio::test]
    async fn validation_runs_before_workspace_and_storage() {
        let root = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .workspace_root(root.path())
            .build()
            .unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let converter = converter(storage.clone(), config);

        let response = converter.handle(ConversionRequest::default()).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
        assert_eq!(storage.put_attempts(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_cleans_workspace() {
        let root = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .workspace_root(root.path())
            .build()
            .unwrap();
        let converter = converter(Arc::new(MemoryStorage::new()), config);

        let err = converter
            .convert(&ConversionRequest::new("bucket", "job/absent.pptx", "absent.pptx"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::Fetch { .. }), "got: {err:?}");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn workspace_uses_prefix_and_root() {
        let root = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .workspace_root(root.path())
            .build()
            .unwrap();
        let converter = converter(Arc::new(MemoryStorage::new()), config);

        let ws = converter.create_workspace().unwrap();
        assert!(ws.path().starts_with(root.path()));
        let name = ws.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(WORKSPACE_PREFIX), "{name}");
    }
}
