//! DICOM Part-10 container parsing.
//!
//! This module turns a complete in-memory byte buffer into a
//! [`DicomDataset`]: it validates the preamble and signature, walks the
//! tagged data elements to recover geometry and photometric attributes,
//! locates the raw pixel-sample region, and computes a window/level fallback
//! when the container does not declare one.
//!
//! # Container Structure
//!
//! ```text
//! Bytes 0-127:   preamble (ignored)
//! Bytes 128-131: "DICM" signature (expected, not strictly enforced)
//! Bytes 132-:    data elements, (group,element) tagged:
//!
//!   explicit VR, short form: [tag 4][VR 2][len u16][value]
//!   explicit VR, long form:  [tag 4][VR 2][reserved 2][len u32][value]
//!   implicit VR:             [tag 4][len u32][value]
//! ```
//!
//! Some non-conformant producers omit the preamble and signature entirely;
//! the parser then proceeds in degraded mode (warning, elements assumed to
//! start at offset 0) rather than failing outright. A structured-parse
//! failure triggers a best-effort secondary pass that scans for the
//! Rows/Columns tag byte patterns directly.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::ParseError;

use super::dataset::DicomDataset;
use super::syntax::TransferSyntax;
use super::tags::{
    is_known_vr, vr_has_long_header, Tag, BITS_ALLOCATED, BITS_STORED, COLUMNS, NUMBER_OF_FRAMES,
    PIXEL_DATA, PIXEL_REPRESENTATION, ROWS, SAMPLES_PER_PIXEL, TRANSFER_SYNTAX_UID, WINDOW_CENTER,
    WINDOW_WIDTH,
};

// =============================================================================
// Constants
// =============================================================================

/// Fixed preamble length in bytes.
pub const PREAMBLE_SIZE: usize = 128;

/// Expected 4-byte signature following the preamble.
pub const DICM_SIGNATURE: &[u8; 4] = b"DICM";

/// Minimum buffer length: preamble plus signature.
pub const MIN_BUFFER_SIZE: usize = PREAMBLE_SIZE + DICM_SIGNATURE.len();

/// Marker for undefined element length (implies encapsulated pixel data).
const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Maximum number of samples inspected when computing the window fallback.
///
/// Sampling a bounded prefix keeps `(min+max)/2` estimation O(1) in the image
/// size for very large multi-frame buffers.
const WINDOW_SAMPLE_LIMIT: usize = 4096;

/// Default geometry assumed by the degraded secondary pass.
const FALLBACK_DIMENSION: u16 = 512;

// =============================================================================
// Signature Detection
// =============================================================================

/// Check whether a buffer carries the Part-10 "DICM" signature at offset 128.
#[inline]
pub fn has_dicm_signature(buffer: &[u8]) -> bool {
    buffer.len() >= MIN_BUFFER_SIZE
        && &buffer[PREAMBLE_SIZE..PREAMBLE_SIZE + 4] == DICM_SIGNATURE
}

// =============================================================================
// Entry Point
// =============================================================================

/// Parse a complete DICOM buffer into an immutable [`DicomDataset`].
///
/// # Errors
///
/// - `TooSmallBuffer` if the buffer cannot hold preamble + signature
/// - `UnsupportedTransferSyntax` for compressed/encapsulated pixel data
/// - `OutOfBounds` if the declared pixel region exceeds the buffer
/// - `MissingPixelData` if no (7FE0,0010) element exists
/// - `InvalidGeometry` if Rows or Columns are zero
///
/// Malformed element structure does not fail the parse outright: a secondary
/// tag-pattern scan recovers geometry (defaulting to 512x512) and assumes the
/// pixel region occupies the buffer's tail.
pub fn parse_dataset(buffer: &Bytes) -> Result<DicomDataset, ParseError> {
    if buffer.len() < MIN_BUFFER_SIZE {
        return Err(ParseError::TooSmallBuffer {
            required: MIN_BUFFER_SIZE,
            actual: buffer.len(),
        });
    }

    let start = if has_dicm_signature(buffer) {
        PREAMBLE_SIZE + 4
    } else {
        // Non-conformant producers sometimes omit the preamble and signature.
        warn!("missing DICM signature at offset 128, parsing in degraded mode");
        0
    };

    match parse_elements(buffer, start) {
        Ok(dataset) => Ok(dataset),
        // Structural damage is recoverable; everything else is fatal.
        Err(ParseError::MalformedElement { offset, message }) => {
            warn!(
                offset,
                "structured parse failed ({message}), falling back to tag scan"
            );
            parse_fallback(buffer)
        }
        Err(err) => Err(err),
    }
}

// =============================================================================
// Structured Element Walk
// =============================================================================

/// Attributes accumulated while walking the element stream.
#[derive(Default)]
struct RawAttributes {
    rows: Option<u16>,
    columns: Option<u16>,
    bits_allocated: Option<u16>,
    bits_stored: Option<u16>,
    samples_per_pixel: Option<u16>,
    frame_count: Option<usize>,
    signed: Option<bool>,
    window_center: Option<f32>,
    window_width: Option<f32>,
    transfer_syntax: Option<TransferSyntax>,
    pixel_region: Option<(usize, usize)>,
}

fn parse_elements(buffer: &Bytes, start: usize) -> Result<DicomDataset, ParseError> {
    let buf: &[u8] = buffer;
    let mut attrs = RawAttributes::default();
    let mut pos = start;
    let mut body_big_endian = false;

    while pos + 8 <= buf.len() {
        let elem_offset = pos;

        // File meta elements (group 0002) are always explicit-VR LE; the
        // byte order of the main body follows the declared transfer syntax.
        let group_le = read_u16(buf, pos, false);
        let tag_be = body_big_endian && group_le != 0x0002;
        let tag = Tag::new(
            read_u16(buf, pos, tag_be),
            read_u16(buf, pos + 2, tag_be),
        );
        pos += 4;

        // Distinguish explicit from implicit headers by sniffing the VR
        // bytes: implicit streams put a 4-byte length here, which almost
        // never forms a valid VR code.
        let vr = [buf[pos], buf[pos + 1]];
        let (value_len, value_start) = if is_known_vr(vr) {
            if vr_has_long_header(vr) {
                if pos + 8 > buf.len() {
                    return Err(truncated(elem_offset));
                }
                let len = read_u32(buf, pos + 4, tag_be);
                (len, pos + 8)
            } else {
                let len = u32::from(read_u16(buf, pos + 2, tag_be));
                (len, pos + 4)
            }
        } else {
            if pos + 4 > buf.len() {
                return Err(truncated(elem_offset));
            }
            let len = read_u32(buf, pos, tag_be);
            (len, pos + 4)
        };

        if value_len == UNDEFINED_LENGTH {
            if tag == PIXEL_DATA {
                // Undefined-length pixel data means encapsulated frames.
                return Err(ParseError::UnsupportedTransferSyntax(
                    "encapsulated pixel data (undefined length)".to_string(),
                ));
            }
            // Undefined-length sequences cannot be skipped without a full
            // sequence parser; hand over to the degraded pass.
            return Err(ParseError::MalformedElement {
                offset: elem_offset,
                message: format!("undefined-length element {tag}"),
            });
        }

        let value_len = value_len as usize;
        let value_end = value_start.checked_add(value_len).ok_or_else(|| {
            ParseError::MalformedElement {
                offset: elem_offset,
                message: format!("element {tag} length overflows"),
            }
        })?;

        if value_end > buf.len() {
            if tag == PIXEL_DATA {
                return Err(ParseError::OutOfBounds {
                    offset: value_start,
                    length: value_len,
                    buffer_len: buf.len(),
                });
            }
            return Err(ParseError::MalformedElement {
                offset: elem_offset,
                message: format!("element {tag} value exceeds buffer"),
            });
        }

        let value = &buf[value_start..value_end];
        match tag {
            TRANSFER_SYNTAX_UID => {
                let syntax = TransferSyntax::from_uid(&ascii_value(value));
                debug!(syntax = syntax.name(), "transfer syntax declared");
                syntax.ensure_uncompressed()?;
                body_big_endian = syntax.is_big_endian();
                attrs.transfer_syntax = Some(syntax);
            }
            ROWS => attrs.rows = read_us_value(value, tag_be),
            COLUMNS => attrs.columns = read_us_value(value, tag_be),
            BITS_ALLOCATED => attrs.bits_allocated = read_us_value(value, tag_be),
            BITS_STORED => attrs.bits_stored = read_us_value(value, tag_be),
            SAMPLES_PER_PIXEL => attrs.samples_per_pixel = read_us_value(value, tag_be),
            PIXEL_REPRESENTATION => {
                attrs.signed = read_us_value(value, tag_be).map(|v| v == 1);
            }
            NUMBER_OF_FRAMES => {
                attrs.frame_count = ascii_value(value).trim().parse::<usize>().ok();
            }
            WINDOW_CENTER => attrs.window_center = parse_first_decimal(value),
            WINDOW_WIDTH => attrs.window_width = parse_first_decimal(value),
            PIXEL_DATA => {
                attrs.pixel_region = Some((value_start, value_len));
                // Pixel data is the last element this pipeline consumes.
                break;
            }
            _ => {}
        }

        pos = value_end;
    }

    build_dataset(buffer, attrs)
}

fn truncated(offset: usize) -> ParseError {
    ParseError::MalformedElement {
        offset,
        message: "element header truncated".to_string(),
    }
}

/// Assemble and validate the final dataset from accumulated attributes.
fn build_dataset(buffer: &Bytes, attrs: RawAttributes) -> Result<DicomDataset, ParseError> {
    let transfer_syntax = attrs.transfer_syntax.unwrap_or_default();
    transfer_syntax.ensure_uncompressed()?;

    let (pixel_offset, pixel_len) = attrs.pixel_region.ok_or(ParseError::MissingPixelData)?;

    let rows = attrs.rows.unwrap_or(0);
    let columns = attrs.columns.unwrap_or(0);
    if rows == 0 || columns == 0 {
        return Err(ParseError::InvalidGeometry { rows, cols: columns });
    }

    let bits_allocated = attrs.bits_allocated.unwrap_or(8);
    let bits_stored = attrs.bits_stored.unwrap_or(bits_allocated);
    let samples_per_pixel = attrs.samples_per_pixel.unwrap_or(1);
    let frame_count = attrs.frame_count.unwrap_or(1).max(1);
    let signed = attrs.signed.unwrap_or(false);

    let pixel_data = buffer.slice(pixel_offset..pixel_offset + pixel_len);

    // Window tags may be absent, zero, or negative; all three get the
    // min/max fallback sampled from a bounded prefix of the pixel data.
    let declared = match (attrs.window_center, attrs.window_width) {
        (Some(center), Some(width)) if width > 0.0 => Some((center, width)),
        _ => None,
    };
    let window_from_tags = declared.is_some();
    let (window_center, window_width) = declared.unwrap_or_else(|| {
        let fallback = sample_window_fallback(
            &pixel_data,
            bits_allocated,
            signed,
            transfer_syntax.is_big_endian(),
        );
        debug!(
            center = fallback.0,
            width = fallback.1,
            "window tags absent or degenerate, using sampled fallback"
        );
        fallback
    });

    let dataset = DicomDataset {
        rows,
        columns,
        bits_allocated,
        bits_stored,
        samples_per_pixel,
        frame_count,
        signed,
        window_center,
        window_width,
        window_from_tags,
        transfer_syntax,
        pixel_data,
    };

    if !dataset.geometry_consistent() {
        warn!(
            nominal = dataset.nominal_frame_size(),
            actual = dataset.frame_size(),
            "frame byte span disagrees with declared geometry"
        );
    }

    Ok(dataset)
}

// =============================================================================
// Degraded Secondary Pass
// =============================================================================

/// Best-effort recovery when the element stream is structurally damaged.
///
/// Scans for the little-endian byte patterns of the Rows and Columns tags and
/// reads the u16 value at the fixed offset shared by the explicit-US and
/// implicit layouts. Geometry defaults to 512x512 when the tags cannot be
/// found; the pixel region is assumed to occupy the buffer's tail.
fn parse_fallback(buffer: &Bytes) -> Result<DicomDataset, ParseError> {
    let buf: &[u8] = buffer;

    let rows = scan_u16_tag(buf, ROWS).unwrap_or(FALLBACK_DIMENSION);
    let columns = scan_u16_tag(buf, COLUMNS).unwrap_or(FALLBACK_DIMENSION);
    let bits_allocated = scan_u16_tag(buf, BITS_ALLOCATED).unwrap_or(16);

    let nominal = usize::from(bits_allocated / 8).max(1) * usize::from(rows) * usize::from(columns);
    let tail_start = buffer.len().saturating_sub(nominal);
    let pixel_data = buffer.slice(tail_start..);

    let (window_center, window_width) =
        sample_window_fallback(&pixel_data, bits_allocated, false, false);

    warn!(
        rows,
        columns,
        bits_allocated,
        region_len = pixel_data.len(),
        "recovered dataset via degraded tag scan"
    );

    Ok(DicomDataset {
        rows,
        columns,
        bits_allocated,
        bits_stored: bits_allocated,
        samples_per_pixel: 1,
        frame_count: 1,
        signed: false,
        window_center,
        window_width,
        window_from_tags: false,
        transfer_syntax: TransferSyntax::default(),
        pixel_data,
    })
}

/// Find the first occurrence of a tag's little-endian byte pattern and read
/// the u16 value 8 bytes past the tag start (the value position in both the
/// explicit-US and implicit layouts).
fn scan_u16_tag(buf: &[u8], tag: Tag) -> Option<u16> {
    let pattern = [
        (tag.group & 0xFF) as u8,
        (tag.group >> 8) as u8,
        (tag.element & 0xFF) as u8,
        (tag.element >> 8) as u8,
    ];
    buf.windows(4)
        .position(|w| w == pattern)
        .and_then(|at| buf.get(at + 8..at + 10))
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .filter(|&v| v != 0)
}

// =============================================================================
// Window Fallback Sampling
// =============================================================================

/// Compute `(center, width)` as `((min+max)/2, max-min)` over a bounded
/// prefix of the pixel region.
fn sample_window_fallback(
    pixel_data: &[u8],
    bits_allocated: u16,
    signed: bool,
    big_endian: bool,
) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    if bits_allocated > 8 {
        let limit = WINDOW_SAMPLE_LIMIT.min(pixel_data.len() / 2);
        for i in 0..limit {
            let raw = read_u16(pixel_data, i * 2, big_endian);
            let val = if signed { f32::from(raw as i16) } else { f32::from(raw) };
            min = min.min(val);
            max = max.max(val);
        }
    } else {
        let limit = WINDOW_SAMPLE_LIMIT.min(pixel_data.len());
        for &b in &pixel_data[..limit] {
            let val = f32::from(b);
            min = min.min(val);
            max = max.max(val);
        }
    }

    if min > max {
        // Empty region: any positive width keeps the transform well-defined.
        return (128.0, 256.0);
    }

    ((min + max) / 2.0, (max - min).max(1.0))
}

// =============================================================================
// Value Readers
// =============================================================================

#[inline]
fn read_u16(buf: &[u8], pos: usize, big_endian: bool) -> u16 {
    if big_endian {
        u16::from_be_bytes([buf[pos], buf[pos + 1]])
    } else {
        u16::from_le_bytes([buf[pos], buf[pos + 1]])
    }
}

#[inline]
fn read_u32(buf: &[u8], pos: usize, big_endian: bool) -> u32 {
    if big_endian {
        u32::from_be_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
    } else {
        u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
    }
}

fn read_us_value(value: &[u8], big_endian: bool) -> Option<u16> {
    (value.len() >= 2).then(|| read_u16(value, 0, big_endian))
}

fn ascii_value(value: &[u8]) -> String {
    String::from_utf8_lossy(value)
        .trim_matches(['\0', ' '])
        .to_string()
}

/// Parse the first value of a (possibly multi-valued) decimal string.
///
/// Window center/width are DS elements that may carry several
/// backslash-separated values; the first applies to the default view.
fn parse_first_decimal(value: &[u8]) -> Option<f32> {
    ascii_value(value)
        .split('\\')
        .next()
        .and_then(|s| s.trim().parse::<f32>().ok())
}

// =============================================================================
// Tests
// =============================================================================
