//! Thumbnail encoder.
//!
//! Turns the bytes of a full-resolution slide image into a small JPEG:
//!
//! 1. Decode (PNG, JPEG or WebP) into RGBA
//! 2. Downscale with Lanczos3 if wider than the target width
//! 3. Composite onto an opaque white background
//! 4. Encode as JPEG at a fixed quality
//!
//! Images are never upscaled. The output for a given input, width and
//! quality is byte-for-byte identical across runs.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageReader, Rgb, RgbImage, RgbaImage};

use crate::error::ThumbnailError;

/// Default JPEG quality (1-100).
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_THUMBNAIL_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_THUMBNAIL_QUALITY: u8 = 100;

/// Default maximum thumbnail width in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 280;

/// Largest accepted maximum width.
pub const MAX_THUMBNAIL_WIDTH: u32 = 4096;

// =============================================================================
// Rendered Thumbnail
// =============================================================================

/// An encoded thumbnail together with its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedThumbnail {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Thumbnail Encoder
// =============================================================================

/// Stateless decode / resize / flatten / encode pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailEncoder {
    quality: u8,
}

impl Default for ThumbnailEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailEncoder {
    /// Create an encoder using [`DEFAULT_THUMBNAIL_QUALITY`].
    pub fn new() -> Self {
        Self::with_quality(DEFAULT_THUMBNAIL_QUALITY)
    }

    /// Create an encoder with a fixed output quality, clamped to 1-100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Render a thumbnail no wider than `max_width`.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::DecodeError`] if `source` is not a supported
    /// image and [`ThumbnailError::EncodeError`] if JPEG encoding fails.
    pub fn render(&self, source: &[u8], max_width: u32) -> Result<RenderedThumbnail, ThumbnailError> {
        if max_width == 0 {
            return Err(ThumbnailError::InvalidWidth { width: max_width });
        }

        let rgba = decode_rgba(source)?;
        let (width, height) = rgba.dimensions();

        let rgba = if width > max_width {
            let (new_w, new_h) = scaled_size(width, height, max_width);
            imageops::resize(&rgba, new_w, new_h, FilterType::Lanczos3)
        } else {
            rgba
        };

        let rgb = flatten_onto_white(&rgba);
        let (width, height) = rgb.dimensions();

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| ThumbnailError::EncodeError {
                message: e.to_string(),
            })?;

        Ok(RenderedThumbnail {
            data: Bytes::from(output),
            width,
            height,
        })
    }

    /// Get image dimensions without decoding pixel data.
    pub fn dimensions(&self, source: &[u8]) -> Result<(u32, u32), ThumbnailError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| ThumbnailError::DecodeError {
                message: e.to_string(),
            })?;

        reader
            .into_dimensions()
            .map_err(|e| ThumbnailError::DecodeError {
                message: e.to_string(),
            })
    }
}

fn decode_rgba(source: &[u8]) -> Result<RgbaImage, ThumbnailError> {
    let img = image::load_from_memory(source).map_err(|e| ThumbnailError::DecodeError {
        message: e.to_string(),
    })?;
    Ok(img.into_rgba8())
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Target size when scaling `width x height` down to `max_width`.
///
/// Height keeps the aspect ratio, rounded down, and never drops below 1.
pub fn scaled_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let new_height = (height as u64 * max_width as u64 / width as u64) as u32;
    (max_width, new_height.max(1))
}

/// Composite an RGBA image onto opaque white.
pub fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([blend(r, a), blend(g, a), blend(b, a)])
    })
}

#[inline]
fn blend(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_THUMBNAIL_QUALITY..=MAX_THUMBNAIL_QUALITY).contains(&quality)
}

/// Clamp quality to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_THUMBNAIL_QUALITY, MAX_THUMBNAIL_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
