//! Intensity normalization of raw frame samples.
//!
//! Raw DICOM samples are 8-bit or 16-bit integers with study-dependent
//! dynamic range; normalization rescales a frame's samples to the full
//! `[0, 255]` display range and expands them to RGBA for uniform
//! downstream handling.
//!
//! Frames with zero intensity variation (all-uniform samples) are a
//! data-quality defect, not a parse failure: they render as a synthetic
//! horizontal gradient so the viewer shows something visibly artificial
//! instead of a blank canvas.

use bytes::Bytes;
use tracing::warn;

use crate::format::DicomDataset;

/// Upper bound on the samples scanned for a frame's min/max. Values past the
/// bound still rescale, clamped into `[0, 255]`.
const MINMAX_SAMPLE_LIMIT: usize = 1 << 20;

// =============================================================================
// Normalized Frame
// =============================================================================

/// A display-ready frame: RGBA, 8 bits per channel, alpha always 255.
///
/// Immutable once created; cached instances are shared by cloning the
/// underlying [`Bytes`] handle.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA pixel buffer, `width * height * 4` bytes.
    pub pixels: Bytes,
    /// True when the source samples carried no intensity variation and a
    /// placeholder gradient was synthesized instead.
    pub degenerate: bool,
}

impl NormalizedFrame {
    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Convert a frame's raw byte slice into a [`NormalizedFrame`].
///
/// 16-bit samples are read in the dataset's declared byte order and
/// rescaled by the frame's own min/max; 8-bit samples pass through
/// unscaled. Other bit depths degrade to a byte-wise copy with a logged
/// warning. This function does not fail: degenerate input produces a
/// flagged placeholder rather than an error.
pub fn normalize_frame(dataset: &DicomDataset, raw: &[u8]) -> NormalizedFrame {
    let width = dataset.width();
    let height = dataset.height();

    let luma = match dataset.bits_allocated {
        16 => normalize_16bit(raw, dataset.signed, dataset.transfer_syntax.is_big_endian()),
        8 => normalize_8bit(raw),
        other => {
            warn!(
                bits_allocated = other,
                "unsupported sample depth, degrading to byte-wise copy"
            );
            Some(raw.to_vec())
        }
    };

    match luma {
        Some(mut values) => {
            values.resize(width as usize * height as usize, 0);
            NormalizedFrame {
                width,
                height,
                pixels: luma_to_rgba(&values),
                degenerate: false,
            }
        }
        None => {
            warn!(width, height, "uniform frame samples, rendering placeholder gradient");
            placeholder_gradient(width, height)
        }
    }
}

/// Rescale 16-bit words to `[0, 255]` by the frame's min/max.
///
/// Returns `None` when every sample is identical.
fn normalize_16bit(raw: &[u8], signed: bool, big_endian: bool) -> Option<Vec<u8>> {
    let sample_count = raw.len() / 2;
    if sample_count == 0 {
        return None;
    }

    let read = |i: usize| -> f32 {
        let word = if big_endian {
            u16::from_be_bytes([raw[i * 2], raw[i * 2 + 1]])
        } else {
            u16::from_le_bytes([raw[i * 2], raw[i * 2 + 1]])
        };
        if signed {
            f32::from(word as i16)
        } else {
            f32::from(word)
        }
    };

    let stride = (sample_count / MINMAX_SAMPLE_LIMIT).max(1);
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for i in (0..sample_count).step_by(stride) {
        let v = read(i);
        min = min.min(v);
        max = max.max(v);
    }
    if min == max {
        return None;
    }

    let scale = 255.0 / (max - min);
    let mut out = Vec::with_capacity(sample_count);
    for i in 0..sample_count {
        out.push(((read(i) - min) * scale).round().clamp(0.0, 255.0) as u8);
    }
    Some(out)
}

/// 8-bit samples pass through directly; `None` when all-uniform.
fn normalize_8bit(raw: &[u8]) -> Option<Vec<u8>> {
    let first = *raw.first()?;
    if raw.iter().all(|&b| b == first) {
        return None;
    }
    Some(raw.to_vec())
}

/// Expand a grayscale buffer into RGBA with alpha 255.
pub(crate) fn luma_to_rgba(luma: &[u8]) -> Bytes {
    let mut rgba = Vec::with_capacity(luma.len() * 4);
    for &v in luma {
        rgba.extend_from_slice(&[v, v, v, 255]);
    }
    Bytes::from(rgba)
}

/// Synthesize the degenerate-data placeholder: a left-to-right gradient.
fn placeholder_gradient(width: u32, height: u32) -> NormalizedFrame {
    let span = width.max(2) - 1;
    let mut row = Vec::with_capacity(width as usize);
    for x in 0..width {
        row.push((x * 255 / span) as u8);
    }

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for _ in 0..height {
        for &v in &row {
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }

    NormalizedFrame {
        width,
        height,
        pixels: Bytes::from(rgba),
        degenerate: true,
    }
}
