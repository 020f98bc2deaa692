//! Viewport composition: zoom, pan, and rotation.
//!
//! Presentation-only geometry applied after window/leveling; nothing here
//! changes pixel values, only where they land on screen. Transforms compose
//! around the image center in a fixed order: scale, then translation, then
//! rotation.

use bytes::Bytes;

use crate::frame::NormalizedFrame;

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f32 = 8.0;

// =============================================================================
// Viewport
// =============================================================================

/// Presentation state for one rendered view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Scale factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`
    pub zoom: f32,
    /// Horizontal pan in output pixels
    pub pan_x: f32,
    /// Vertical pan in output pixels
    pub pan_y: f32,
    /// Clockwise rotation in degrees, normalized to `[0, 360)`
    pub rotation: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            rotation: 0.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zoom factor, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Multiply the current zoom by `factor`, clamped.
    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    /// Shift the view by output-pixel deltas.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Rotate clockwise by `degrees`, keeping rotation in `[0, 360)`.
    pub fn rotate_by(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    /// Back to identity: zoom 1, no pan, no rotation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the rotation is an exact quarter turn.
    fn quarter_turns(&self) -> Option<u32> {
        let r = self.rotation.rem_euclid(360.0);
        if r % 90.0 == 0.0 {
            Some((r / 90.0) as u32 % 4)
        } else {
            None
        }
    }

    fn is_identity_but_rotation(&self) -> bool {
        self.zoom == 1.0 && self.pan_x == 0.0 && self.pan_y == 0.0
    }
}

// =============================================================================
// Compositing
// =============================================================================

/// Render a frame through a viewport into an output buffer of the given
/// dimensions. Source pixels are sampled nearest-neighbor; regions outside
/// the image fill with opaque black.
pub fn composite(
    frame: &NormalizedFrame,
    viewport: &Viewport,
    out_width: u32,
    out_height: u32,
) -> NormalizedFrame {
    // Exact quarter turns with no zoom/pan are pure index shuffles
    if viewport.is_identity_but_rotation() {
        if let Some(turns) = viewport.quarter_turns() {
            let rotated = rotate_quarter(frame, turns);
            if rotated.width == out_width && rotated.height == out_height {
                return rotated;
            }
        }
    }

    composite_general(frame, viewport, out_width, out_height)
}

/// Rotate by `turns` quarter turns clockwise without resampling.
fn rotate_quarter(frame: &NormalizedFrame, turns: u32) -> NormalizedFrame {
    if turns == 0 {
        return frame.clone();
    }
    let (w, h) = (frame.width as usize, frame.height as usize);
    let (out_w, out_h) = if turns % 2 == 0 { (w, h) } else { (h, w) };

    let mut out = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let (ox, oy) = match turns {
                1 => (h - 1 - y, x),
                2 => (w - 1 - x, h - 1 - y),
                _ => (y, w - 1 - x),
            };
            let src = (y * w + x) * 4;
            let dst = (oy * out_w + ox) * 4;
            out[dst..dst + 4].copy_from_slice(&frame.pixels[src..src + 4]);
        }
    }

    NormalizedFrame {
        width: out_w as u32,
        height: out_h as u32,
        pixels: Bytes::from(out),
        degenerate: frame.degenerate,
    }
}

/// General path: inverse-map each output pixel through rotation, pan, and
/// zoom back into source coordinates.
fn composite_general(
    frame: &NormalizedFrame,
    viewport: &Viewport,
    out_width: u32,
    out_height: u32,
) -> NormalizedFrame {
    let theta = viewport.rotation.to_radians();
    let (sin, cos) = theta.sin_cos();
    let zoom = viewport.zoom.clamp(MIN_ZOOM, MAX_ZOOM);

    let src_w = frame.width as f32;
    let src_h = frame.height as f32;
    let cx = out_width as f32 / 2.0;
    let cy = out_height as f32 / 2.0;

    let mut out = vec![0u8; out_width as usize * out_height as usize * 4];
    for oy in 0..out_height {
        for ox in 0..out_width {
            // Output pixel relative to center, pan undone
            let dx = ox as f32 + 0.5 - cx - viewport.pan_x;
            let dy = oy as f32 + 0.5 - cy - viewport.pan_y;
            // Undo rotation (inverse = rotate by -theta)
            let rx = dx * cos + dy * sin;
            let ry = -dx * sin + dy * cos;
            // Undo zoom, back to source coordinates
            let sx = rx / zoom + src_w / 2.0;
            let sy = ry / zoom + src_h / 2.0;

            let dst = (oy as usize * out_width as usize + ox as usize) * 4;
            if sx >= 0.0 && sy >= 0.0 && sx < src_w && sy < src_h {
                let src = (sy as usize * frame.width as usize + sx as usize) * 4;
                out[dst..dst + 4].copy_from_slice(&frame.pixels[src..src + 4]);
            } else {
                // Outside the image: opaque black
                out[dst + 3] = 255;
            }
        }
    }

    NormalizedFrame {
        width: out_width,
        height: out_height,
        pixels: Bytes::from(out),
        degenerate: frame.degenerate,
    }
}

// =============================================================================
// Tests
// =============================================================================
