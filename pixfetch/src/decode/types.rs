//! Decoder types and traits

use crate::cache::Weighted;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Bytes are not a supported or well-formed image.
    #[error("Invalid image data: {0}")]
    Format(String),

    /// The decoder produced nothing.
    #[error("Decoder produced an empty image")]
    Empty,

    /// The decoder hit its memory limit.
    #[error("Out of memory while decoding: {0}")]
    ResourceExhausted(String),
}

/// Source dimensions read without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub height: u32,
    pub width: u32,
}

impl ImageBounds {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

/// A decoded RGBA8 image held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap raw RGBA8 pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel data, row major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes held by the pixel buffer.
    pub fn byte_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

impl From<image::RgbaImage> for DecodedImage {
    fn from(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }
}

impl Weighted for DecodedImage {
    fn weight(&self) -> usize {
        self.byte_count()
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Trait for image decoders.
///
/// Decoding runs in two passes: [`bounds_of`](Decoder::bounds_of) reads only
/// the header, then [`decode`](Decoder::decode) materializes pixels at the
/// chosen subsample factor. Both calls block.
pub trait Decoder: Send + Sync {
    /// Read source dimensions without decoding pixels.
    fn bounds_of(&self, bytes: &[u8]) -> Result<ImageBounds, DecodeError>;

    /// Decode, keeping one pixel in `sample_size` along each axis.
    ///
    /// `sample_size` is a power of two, at least 1.
    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<DecodedImage, DecodeError>;
}
