//! CLI binary for pptx2jpeg.
//!
//! A thin shim over the library crate: maps flags to a `ConversionRequest`
//! and `ConversionConfig`, runs one job and prints the response envelope.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pptx2jpeg::{
    ConversionConfig, ConversionProgressCallback, ConversionRequest, Converter, LocalStorage,
    Locale, ObjectStorage, ProgressCallback, S3Storage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the document renders, then one bar step per published slide.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Fetching presentation…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} slides  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Publishing");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_job_start(&self, job_id: &str) {
        self.bar.set_message(format!("job {job_id}: rendering…"));
    }

    fn on_render_complete(&self, page_count: usize, duration_ms: u64) {
        self.bar.println(format!(
            "{} Rendered {} pages {}",
            green("◆"),
            bold(&page_count.to_string()),
            dim(&format!("in {:.1}s", duration_ms as f64 / 1000.0)),
        ));
        self.activate_bar(page_count);
    }

    fn on_slide_optimized(&self, slide: usize, _total: usize, bytes: usize, floor_reached: bool) {
        if floor_reached {
            self.bar.println(format!(
                "  {} Slide {:>2} still {} bytes at minimum scale",
                yellow("⚠"),
                slide,
                bytes
            ));
        }
    }

    fn on_slide_published(&self, slide: usize, total: usize, storage_key: &str) {
        self.bar.println(format!(
            "  {} Slide {:>2}/{:<2}  {}",
            green("✓"),
            slide,
            total,
            dim(storage_key)
        ));
        self.bar.inc(1);
    }

    fn on_job_complete(&self, slide_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} slides published",
            green("✔"),
            bold(&slide_count.to_string())
        );
    }

    fn on_job_failed(&self, stage: &str, error: &str) {
        self.bar.abandon();
        eprintln!("{} {} failed: {}", red("✘"), stage, error);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a deck stored in S3 (credentials from the usual AWS sources)
  pptx2jpeg --location my-bucket --key 3f9c/deck.pptx

  # Same job against a local directory laid out as <root>/<location>/<key>
  pptx2jpeg --local-root ./store --location inbox --key job1/deck.pptx

  # Replay a Lambda event
  pptx2jpeg --payload event.json

  # Japanese error messages, custom soffice
  pptx2jpeg --locale ja --soffice /opt/libreoffice/program/soffice --payload event.json

OUTPUT:
  The response envelope {statusCode, body} is printed to stdout as JSON.
  The exit status is 0 for statusCode 200 and 1 otherwise.

ENVIRONMENT VARIABLES:
  PPTX2JPEG_SOFFICE       Path to the soffice binary (default: soffice)
  PPTX2JPEG_PDFIUM_DIR    Directory containing libpdfium
  PPTX2JPEG_LOCAL_ROOT    Use a local directory store instead of S3
  RUST_LOG                Override the log filter (e.g. pptx2jpeg=debug)
"#;

/// Convert a slide presentation into size-bounded JPEGs, one per slide.
#[derive(Parser, Debug)]
#[command(
    name = "pptx2jpeg",
    version,
    about = "Convert a slide presentation in object storage into one JPEG per slide",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Storage location (S3 bucket, or sub-directory of --local-root).
    #[arg(long, env = "PPTX2JPEG_LOCATION", required_unless_present = "payload")]
    location: Option<String>,

    /// Object key of the presentation; its first segment is the job id.
    #[arg(long, env = "PPTX2JPEG_KEY", required_unless_present = "payload")]
    key: Option<String>,

    /// Original file name. Default: last segment of --key.
    #[arg(long)]
    file_name: Option<String>,

    /// Read the request from a JSON event file instead of flags.
    #[arg(long, conflicts_with_all = ["location", "key", "file_name"])]
    payload: Option<PathBuf>,

    /// Serve storage from this directory instead of S3.
    #[arg(long, env = "PPTX2JPEG_LOCAL_ROOT")]
    local_root: Option<PathBuf>,

    /// LibreOffice binary used to render the presentation.
    #[arg(long, env = "PPTX2JPEG_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PPTX2JPEG_PDFIUM_DIR")]
    pdfium_dir: Option<PathBuf>,

    /// Parent directory for temporary job workspaces.
    #[arg(long, env = "PPTX2JPEG_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// Language of error messages: en, ja.
    #[arg(long, env = "PPTX2JPEG_LOCALE", default_value = "en")]
    locale: Locale,

    /// Print the envelope on one line.
    #[arg(long)]
    compact: bool,

    /// Disable progress bar.
    #[arg(long, env = "PPTX2JPEG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the envelope.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Request ──────────────────────────────────────────────────────────
    let request = match cli.payload {
        Some(ref path) => read_payload(path).await?,
        None => request_from_flags(&cli),
    };

    // ── Config + storage ─────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let storage: Arc<dyn ObjectStorage> = match cli.local_root {
        Some(ref root) => {
            anyhow::ensure!(root.is_dir(), "--local-root {} is not a directory", root.display());
            Arc::new(LocalStorage::new(root))
        }
        None => Arc::new(S3Storage::from_env().await),
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let converter = Converter::from_config(storage, config);
    let response = converter.handle(request).await;

    let json = if cli.compact {
        serde_json::to_string(&response)
    } else {
        serde_json::to_string_pretty(&response)
    }
    .context("Failed to serialise response")?;
    println!("{json}");

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .office_binary(&cli.soffice)
        .locale(cli.locale);

    if let Some(ref dir) = cli.pdfium_dir {
        builder = builder.pdfium_library_dir(dir);
    }
    if let Some(ref dir) = cli.workspace_root {
        builder = builder.workspace_root(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn request_from_flags(cli: &Cli) -> ConversionRequest {
    let file_name = cli.file_name.clone().or_else(|| {
        cli.key
            .as_deref()
            .and_then(|k| k.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    });

    ConversionRequest {
        storage_location: cli.location.clone(),
        source_key: cli.key.clone(),
        source_file_name: file_name,
    }
}

async fn read_payload(path: &Path) -> Result<ConversionRequest> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read payload from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Payload {} is not a valid request", path.display()))
}
