//! DICOM tag and value representation definitions.
//!
//! This module defines the vocabulary for DICOM parsing, including:
//! - The `(group, element)` tag type used to identify data elements
//! - Value representation (VR) codes that determine how element lengths
//!   are encoded in explicit-VR transfer syntaxes
//!
//! Only the tags the decode pipeline consumes are named here; all other
//! elements are skipped during parsing.

use std::fmt;

// =============================================================================
// Tag
// =============================================================================

/// A DICOM data element tag: a `(group, element)` pair of 16-bit values.
///
/// Tags order the element stream: within a dataset, elements appear in
/// ascending tag order, which the parser relies on only loosely (it walks
/// sequentially and matches tags by equality).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    /// Create a tag from its group and element numbers.
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Whether this tag belongs to the File Meta Information group (0002).
    ///
    /// File meta elements are always encoded explicit-VR little-endian,
    /// regardless of the transfer syntax that governs the rest of the file.
    #[inline]
    pub const fn is_file_meta(self) -> bool {
        self.group == 0x0002
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}

// =============================================================================
// Consumed Tags
// =============================================================================

/// Transfer Syntax UID (0002,0010) — file meta group.
pub const TRANSFER_SYNTAX_UID: Tag = Tag::new(0x0002, 0x0010);

/// Samples per Pixel (0028,0002).
pub const SAMPLES_PER_PIXEL: Tag = Tag::new(0x0028, 0x0002);

/// Number of Frames (0028,0008) — integer string, defaults to 1 when absent.
pub const NUMBER_OF_FRAMES: Tag = Tag::new(0x0028, 0x0008);

/// Rows (0028,0010) — image height in pixels.
pub const ROWS: Tag = Tag::new(0x0028, 0x0010);

/// Columns (0028,0011) — image width in pixels.
pub const COLUMNS: Tag = Tag::new(0x0028, 0x0011);

/// Bits Allocated (0028,0100).
pub const BITS_ALLOCATED: Tag = Tag::new(0x0028, 0x0100);

/// Bits Stored (0028,0101).
pub const BITS_STORED: Tag = Tag::new(0x0028, 0x0101);

/// Pixel Representation (0028,0103) — 0 unsigned, 1 two's complement.
pub const PIXEL_REPRESENTATION: Tag = Tag::new(0x0028, 0x0103);

/// Window Center (0028,1050) — decimal string, possibly multi-valued.
pub const WINDOW_CENTER: Tag = Tag::new(0x0028, 0x1050);

/// Window Width (0028,1051) — decimal string, possibly multi-valued.
pub const WINDOW_WIDTH: Tag = Tag::new(0x0028, 0x1051);

/// Pixel Data (7FE0,0010) — the raw sample region spanning all frames.
pub const PIXEL_DATA: Tag = Tag::new(0x7FE0, 0x0010);

// =============================================================================
// Value Representations
// =============================================================================

/// Whether a two-character VR code uses the long (reserved + 4-byte length)
/// element header layout in explicit-VR encodings.
///
/// Short-form VRs carry a 2-byte length immediately after the VR code; the
/// long-form VRs (OB, OW, OF, OD, OL, SQ, UC, UR, UT, UN) insert 2 reserved
/// bytes followed by a 4-byte length.
#[inline]
pub fn vr_has_long_header(vr: [u8; 2]) -> bool {
    matches!(
        &vr,
        b"OB" | b"OW" | b"OF" | b"OD" | b"OL" | b"SQ" | b"UC" | b"UR" | b"UT" | b"UN"
    )
}

/// Whether a two-character code is a known VR.
///
/// Used to distinguish explicit-VR streams from implicit-VR streams: in
/// implicit VR the bytes at the VR position belong to the 4-byte length, and
/// are very unlikely to form a valid VR code.
pub fn is_known_vr(vr: [u8; 2]) -> bool {
    matches!(
        &vr,
        b"AE" | b"AS" | b"AT" | b"CS" | b"DA" | b"DS" | b"DT" | b"FL" | b"FD" | b"IS" | b"LO"
            | b"LT" | b"OB" | b"OD" | b"OF" | b"OL" | b"OW" | b"PN" | b"SH" | b"SL" | b"SQ"
            | b"SS" | b"ST" | b"TM" | b"UC" | b"UI" | b"UL" | b"UN" | b"UR" | b"US" | b"UT"
    )
}

// =============================================================================
// Tests
// =============================================================================
