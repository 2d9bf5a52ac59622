//! AWS Lambda entry point.
//!
//! Event: `{storageLocation, sourceKey, sourceFileName}` (or the legacy
//! `bucketName`, `fileKey`, `fileName`). Response: `{statusCode, body}` with
//! `body` JSON-encoded as a string, ready to be forwarded as an API Gateway
//! proxy response. Failures are reported in the envelope, never as
//! invocation errors, so the caller always receives a body.
//!
//! Environment:
//! * `PPTX2JPEG_SOFFICE`    soffice path (default `soffice`)
//! * `PPTX2JPEG_PDFIUM_DIR` directory containing libpdfium
//! * `PPTX2JPEG_LOCALE`     `en` (default) or `ja`
//! * `RUST_LOG`             log filter (default `info`)

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use pptx2jpeg::{
    ConversionConfig, ConversionRequest, Converter, EncodedResponse, Locale, S3Storage,
};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .without_time()
        .init();

    // Cold start: one S3 client and converter per container.
    let storage = Arc::new(S3Storage::from_env().await);
    let converter = Arc::new(Converter::from_config(storage, config_from_env()?));

    run(service_fn(move |event: LambdaEvent<ConversionRequest>| {
        let converter = Arc::clone(&converter);
        async move {
            let response = converter.handle(event.payload).await;
            Ok::<EncodedResponse, Error>(response.to_encoded()?)
        }
    }))
    .await
}

fn config_from_env() -> Result<ConversionConfig, Error> {
    let mut builder = ConversionConfig::builder();

    if let Ok(path) = env::var("PPTX2JPEG_SOFFICE") {
        builder = builder.office_binary(path);
    }
    if let Ok(dir) = env::var("PPTX2JPEG_PDFIUM_DIR") {
        builder = builder.pdfium_library_dir(dir);
    }
    if let Ok(locale) = env::var("PPTX2JPEG_LOCALE") {
        builder = builder.locale(locale.parse::<Locale>()?);
    }

    Ok(builder.build()?)
}
