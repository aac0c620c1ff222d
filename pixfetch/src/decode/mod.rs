//! Two-pass bounded image decoding.
//!
//! The worker first asks a [`Decoder`] for the source bounds, picks a
//! subsample factor with [`subsample_factor`], then decodes at that factor.

mod image_decoder;
mod sample;
mod types;

pub use image_decoder::{ImageDecoder, DEFAULT_MAX_DECODE_ALLOC};
pub use sample::subsample_factor;
pub use types::{DecodeError, DecodedImage, Decoder, ImageBounds};
