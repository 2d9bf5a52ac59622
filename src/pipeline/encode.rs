//! JPEG encoding: `RgbImage` → baseline JPEG bytes.
//!
//! `jpeg-encoder` is used instead of `image`'s built-in encoder because it
//! can compute optimised Huffman tables per image, the equivalent of an
//! encoder's "optimize" mode: same pixels and quality, fewer bytes.

use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder};
use thiserror::Error;
use tracing::trace;

/// Failure to produce a JPEG from an in-memory image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Baseline JPEG stores dimensions as 16-bit values.
    #[error("image {width}x{height} exceeds the JPEG dimension limit of 65535")]
    TooLarge { width: u32, height: u32 },

    #[error(transparent)]
    Jpeg(#[from] jpeg_encoder::EncodingError),
}

/// Encode `image` at `quality` (1–100) with optimised Huffman tables.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();
    let too_large = || EncodeError::TooLarge { width, height };
    let w = u16::try_from(width).map_err(|_| too_large())?;
    let h = u16::try_from(height).map_err(|_| too_large())?;

    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf, quality);
    encoder.set_optimized_huffman_tables(true);
    encoder.encode(image.as_raw(), w, h, ColorType::Rgb)?;

    trace!("Encoded {}x{} @ q{} → {} bytes", width, height, quality, buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn encode_small_image() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let data = encode_jpeg(&img, 90).expect("encode should succeed");
        // SOI marker
        assert_eq!(&data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&data).expect("valid JPEG");
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.height(), 10);
    }

    #[test]
    fn lower_quality_is_not_larger_for_gradients() {
        let img = RgbImage::from_fn(256, 128, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        let high = encode_jpeg(&img, 95).unwrap();
        let low = encode_jpeg(&img, 55).unwrap();
        assert!(low.len() < high.len(), "q55={} q95={}", low.len(), high.len());
    }

    #[test]
    fn deterministic_output() {
        let img = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 0]));
        assert_eq!(encode_jpeg(&img, 80).unwrap(), encode_jpeg(&img, 80).unwrap());
    }

    #[test]
    fn oversized_dimensions_rejected() {
        let img = RgbImage::new(70_000, 1);
        let err = encode_jpeg(&img, 90).unwrap_err();
        assert!(matches!(err, EncodeError::TooLarge { .. }));
    }
}
