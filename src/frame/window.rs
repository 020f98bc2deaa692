//! Window/level intensity mapping.
//!
//! Windowing selects a visible band `[center - width/2, center + width/2]`
//! of raw sample values and stretches it across the display's contrast
//! range. The transform is pure: re-applying it with new parameters never
//! touches cached frames, so the user can sweep center/width interactively
//! without re-decoding.
//!
//! The transform prefers the dataset's retained raw samples; re-quantizing
//! an already-normalized 8-bit buffer loses precision and is only done for
//! sample depths the raw path does not support.

use tracing::debug;

use crate::error::DecodeError;
use crate::format::DicomDataset;

use super::normalize::{luma_to_rgba, NormalizedFrame};

// =============================================================================
// Window/Level
// =============================================================================

/// A `(center, width)` window over raw sample values, `width > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    pub center: f32,
    pub width: f32,
}

/// Named presets, fixed `(center, width)` pairs in raw sample units.
///
/// `calibration` exists for phantom/QA studies whose tags carry no usable
/// window; it is an ordinary preset, not a hidden override.
pub const PRESETS: &[(&str, WindowLevel)] = &[
    ("soft-tissue", WindowLevel { center: 40.0, width: 400.0 }),
    ("bone", WindowLevel { center: 300.0, width: 1500.0 }),
    ("lung", WindowLevel { center: -600.0, width: 1500.0 }),
    ("calibration", WindowLevel { center: 600.0, width: 1600.0 }),
];

impl WindowLevel {
    /// Construct a window, rejecting non-positive widths.
    pub fn new(center: f32, width: f32) -> Result<Self, DecodeError> {
        if !width.is_finite() || !center.is_finite() || width <= 0.0 {
            return Err(DecodeError::InvalidWindow { center, width });
        }
        Ok(Self { center, width })
    }

    /// Look up a named preset.
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, wl)| *wl)
    }

    /// The dataset's declared (or fallback-sampled) window.
    pub fn from_dataset(dataset: &DicomDataset) -> Self {
        Self {
            center: dataset.window_center,
            width: dataset.window_width.max(1.0),
        }
    }

    /// Map one raw sample value into `[0, 255]`.
    ///
    /// Monotonically non-decreasing in `value`.
    #[inline]
    pub fn apply(&self, value: f32) -> u8 {
        let min = self.center - self.width / 2.0;
        let max = self.center + self.width / 2.0;
        if value <= min {
            0
        } else if value >= max {
            255
        } else {
            ((value - min) / (max - min) * 255.0).round().clamp(0.0, 255.0) as u8
        }
    }
}

// =============================================================================
// Frame Transforms
// =============================================================================

/// Window a frame directly from its raw byte slice.
///
/// # Errors
///
/// `UnsupportedBitDepth` when the samples are neither 8 nor 16 bits wide;
/// callers then fall back to [`window_normalized`] on the decoded frame.
pub fn window_raw(
    dataset: &DicomDataset,
    raw: &[u8],
    window: WindowLevel,
) -> Result<NormalizedFrame, DecodeError> {
    let width = dataset.width();
    let height = dataset.height();
    let pixel_count = width as usize * height as usize;

    let mut luma = match dataset.bits_allocated {
        16 => {
            let big_endian = dataset.transfer_syntax.is_big_endian();
            let mut out = Vec::with_capacity(raw.len() / 2);
            for chunk in raw.chunks_exact(2) {
                let word = if big_endian {
                    u16::from_be_bytes([chunk[0], chunk[1]])
                } else {
                    u16::from_le_bytes([chunk[0], chunk[1]])
                };
                let value = if dataset.signed {
                    f32::from(word as i16)
                } else {
                    f32::from(word)
                };
                out.push(window.apply(value));
            }
            out
        }
        8 => raw.iter().map(|&b| window.apply(f32::from(b))).collect(),
        other => return Err(DecodeError::UnsupportedBitDepth(other)),
    };
    luma.resize(pixel_count, 0);

    debug!(
        center = window.center,
        width = window.width,
        "windowed frame from raw samples"
    );

    Ok(NormalizedFrame {
        width,
        height,
        pixels: luma_to_rgba(&luma),
        degenerate: false,
    })
}

/// Re-window an already-normalized frame.
///
/// Lower fidelity than [`window_raw`]: input values were already quantized
/// to 8 bits. Never mutates the input frame.
pub fn window_normalized(frame: &NormalizedFrame, window: WindowLevel) -> NormalizedFrame {
    let luma: Vec<u8> = frame
        .pixels
        .chunks_exact(4)
        .map(|px| window.apply(f32::from(px[0])))
        .collect();

    NormalizedFrame {
        width: frame.width,
        height: frame.height,
        pixels: luma_to_rgba(&luma),
        degenerate: frame.degenerate,
    }
}
