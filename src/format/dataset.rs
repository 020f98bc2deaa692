//! Parsed dataset value type.
//!
//! A [`DicomDataset`] is the immutable product of a successful parse: image
//! geometry, sample layout, the effective window/level pair, and the raw
//! pixel-sample region as an owned zero-copy byte buffer. It is created once
//! per loaded file, held for the viewer's lifetime, and never mutated — frame
//! views are sliced out of `pixel_data` without copying.

use bytes::Bytes;

use super::syntax::TransferSyntax;

/// An immutable, parsed DICOM dataset ready for frame decoding.
#[derive(Clone)]
pub struct DicomDataset {
    /// Image height in pixels (Rows)
    pub rows: u16,

    /// Image width in pixels (Columns)
    pub columns: u16,

    /// Bits allocated per sample (8 or 16 supported; others degrade)
    pub bits_allocated: u16,

    /// Bits actually stored per sample
    pub bits_stored: u16,

    /// Samples per pixel (1 for grayscale)
    pub samples_per_pixel: u16,

    /// Number of frames in the pixel region (≥ 1)
    pub frame_count: usize,

    /// Whether samples are two's-complement signed (Pixel Representation = 1)
    pub signed: bool,

    /// Effective window center (from tags, or computed fallback)
    pub window_center: f32,

    /// Effective window width, always > 0 (from tags, or computed fallback)
    pub window_width: f32,

    /// Whether the window pair came from (0028,1050)/(0028,1051) rather than
    /// the min/max fallback sampling
    pub window_from_tags: bool,

    /// Declared transfer syntax (raw syntaxes only; compressed ones are
    /// rejected at parse time)
    pub transfer_syntax: TransferSyntax,

    /// Raw pixel-sample region spanning all frames
    pub pixel_data: Bytes,
}

impl std::fmt::Debug for DicomDataset {
    // Don't dump the pixel buffer, just its length.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DicomDataset")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("bits_allocated", &self.bits_allocated)
            .field("bits_stored", &self.bits_stored)
            .field("samples_per_pixel", &self.samples_per_pixel)
            .field("frame_count", &self.frame_count)
            .field("signed", &self.signed)
            .field("window_center", &self.window_center)
            .field("window_width", &self.window_width)
            .field("transfer_syntax", &self.transfer_syntax)
            .field("pixel_data.len", &self.pixel_data.len())
            .finish()
    }
}

impl DicomDataset {
    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        u32::from(self.columns)
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        u32::from(self.rows)
    }

    /// Byte length of one frame: `floor(pixel_data.len() / frame_count)`.
    ///
    /// The floor accounts for odd-length padding at the end of the pixel
    /// element; each frame's span is computed from this value, never from the
    /// nominal geometry alone.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.pixel_data.len() / self.frame_count.max(1)
    }

    /// Nominal byte length of one frame derived from geometry:
    /// `bits_allocated/8 * width * height * samples_per_pixel`.
    #[inline]
    pub fn nominal_frame_size(&self) -> usize {
        usize::from(self.bits_allocated / 8).max(1)
            * self.width() as usize
            * self.height() as usize
            * usize::from(self.samples_per_pixel)
    }

    /// Number of pixels per frame.
    #[inline]
    pub fn pixels_per_frame(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Bytes per sample (1 for 8-bit, 2 for 16-bit).
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_allocated / 8).max(1)
    }

    /// Whether the sliced frame length agrees with the nominal geometry.
    ///
    /// A mismatch is tolerated (the slicer clamps to the buffer) but worth a
    /// diagnostic, since it usually means a producer wrote inconsistent tags.
    pub fn geometry_consistent(&self) -> bool {
        let nominal = self.nominal_frame_size();
        let actual = self.frame_size();
        // within rounding: allow the odd-length pad byte
        actual >= nominal && actual <= nominal + 1
    }
}

// =============================================================================
// Tests
// =============================================================================
