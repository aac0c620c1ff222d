//! Decoder backed by the `image` crate.

use super::types::{DecodeError, DecodedImage, Decoder, ImageBounds};
use image::imageops::FilterType;
use image::{ImageError, ImageReader, Limits};
use std::io::Cursor;
use tracing::trace;

/// Default decoder allocation limit (512 MB).
pub const DEFAULT_MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Decodes PNG, JPEG, GIF, WebP and BMP into RGBA8.
///
/// The allocation limit stands in for memory pressure: a decode that would
/// need more is reported as [`DecodeError::ResourceExhausted`].
///
/// The `image` crate exposes no scaled decode for its codecs, so a sample size
/// above 1 decodes the full source and then downsizes it. Peak memory is
/// that of the full-size decode whatever the sample size, and `max_alloc`
/// has to cover the largest source expected, not the largest result.
/// Downsizing happens before the RGBA8 conversion so the converted buffer
/// is only ever result-sized.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    max_alloc: u64,
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self::with_max_alloc(DEFAULT_MAX_DECODE_ALLOC)
    }

    /// Creates a decoder that refuses to allocate more than `max_alloc` bytes.
    pub fn with_max_alloc(max_alloc: u64) -> Self {
        Self { max_alloc }
    }

    pub fn max_alloc(&self) -> u64 {
        self.max_alloc
    }

    fn reader<'a>(&self, bytes: &'a [u8]) -> Result<ImageReader<Cursor<&'a [u8]>>, DecodeError> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Format(format!("Format error: {}", e)))?;

        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_alloc);
        reader.limits(limits);

        Ok(reader)
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(error: ImageError) -> DecodeError {
    match error {
        ImageError::Limits(e) => DecodeError::ResourceExhausted(e.to_string()),
        other => DecodeError::Format(other.to_string()),
    }
}

impl Decoder for ImageDecoder {
    fn bounds_of(&self, bytes: &[u8]) -> Result<ImageBounds, DecodeError> {
        let (width, height) = self.reader(bytes)?.into_dimensions().map_err(classify)?;
        Ok(ImageBounds::new(height, width))
    }

    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<DecodedImage, DecodeError> {
        let image = self.reader(bytes)?.decode().map_err(classify)?;

        let sample_size = sample_size.max(1);
        let image = if sample_size > 1 {
            let width = (image.width() / sample_size).max(1);
            let height = (image.height() / sample_size).max(1);
            trace!(sample_size, width, height, "Subsampling decoded image");
            image.resize_exact(width, height, FilterType::Triangle)
        } else {
            image
        };

        let decoded = DecodedImage::from(image.into_rgba8());
        if decoded.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(decoded)
    }
}
