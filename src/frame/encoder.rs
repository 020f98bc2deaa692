//! PNG frame encoder.
//!
//! Rendered frames travel to the browser as PNG. PNG is lossless, which
//! matters here: window/level output is already quantized to 8 bits and a
//! lossy codec would smear the exact contrast boundaries clinicians adjust
//! for.

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::FrameError;

use super::normalize::NormalizedFrame;

// =============================================================================
// PNG Encoder
// =============================================================================

/// Encodes [`NormalizedFrame`] RGBA buffers as PNG.
///
/// # Example
///
/// ```ignore
/// use dicom_streamer::frame::PngFrameEncoder;
///
/// let encoder = PngFrameEncoder::new();
/// let png: Bytes = encoder.encode(&frame)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PngFrameEncoder {
    // Currently stateless, but struct allows future extension
    // (e.g., compression level, palette output)
}

impl PngFrameEncoder {
    /// Create a new PNG frame encoder.
    pub fn new() -> Self {
        Self {}
    }

    /// Encode a frame's RGBA buffer as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length disagrees with the frame's
    /// declared dimensions or the encoder fails.
    pub fn encode(&self, frame: &NormalizedFrame) -> Result<Bytes, FrameError> {
        let expected = frame.pixel_count() * 4;
        if frame.pixels.len() != expected {
            return Err(FrameError::Encode {
                message: format!(
                    "pixel buffer is {} bytes, expected {} for {}x{} RGBA",
                    frame.pixels.len(),
                    expected,
                    frame.width,
                    frame.height
                ),
            });
        }

        let mut output = Vec::new();
        PngEncoder::new(&mut output)
            .write_image(
                &frame.pixels,
                frame.width,
                frame.height,
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| FrameError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Tests
// =============================================================================
