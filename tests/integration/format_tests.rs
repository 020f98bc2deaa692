//! Parser integration tests over the public API.
//!
//! Tests verify:
//! - Explicit and implicit VR parsing, both byte orders
//! - Signature-less and malformed containers (degraded modes)
//! - Window fallback when tags are absent or unusable
//! - Rejection of encapsulated and compressed pixel data

use bytes::Bytes;

use dicom_streamer::error::ParseError;
use dicom_streamer::format::tags::{
    BITS_ALLOCATED, COLUMNS, PIXEL_DATA, ROWS, TRANSFER_SYNTAX_UID, WINDOW_CENTER, WINDOW_WIDTH,
};
use dicom_streamer::{has_dicm_signature, parse_dataset, TransferSyntax};

use super::test_utils::{build_study, standard_study, DicomBuilder};

// =============================================================================
// Structured Parsing
// =============================================================================

#[test]
fn test_parse_standard_study() {
    let data = Bytes::from(standard_study());
    assert!(has_dicm_signature(&data));

    let ds = parse_dataset(&data).unwrap();
    assert_eq!(ds.rows, 256);
    assert_eq!(ds.columns, 256);
    assert_eq!(ds.bits_allocated, 16);
    assert_eq!(ds.frame_count, 5);
    assert_eq!(ds.transfer_syntax, TransferSyntax::ExplicitVrLittleEndian);
    assert_eq!(ds.pixel_data.len(), 256 * 256 * 2 * 5);
    assert!(ds.window_from_tags);
}

#[test]
fn test_parse_implicit_vr_study() {
    // Implicit VR body: tag + u32 length, no VR field
    let mut data = vec![0u8; 128];
    data.extend_from_slice(b"DICM");

    // File meta stays explicit
    let uid = b"1.2.840.10008.1.2\0";
    data.extend_from_slice(&TRANSFER_SYNTAX_UID.group.to_le_bytes());
    data.extend_from_slice(&TRANSFER_SYNTAX_UID.element.to_le_bytes());
    data.extend_from_slice(b"UI");
    data.extend_from_slice(&(uid.len() as u16).to_le_bytes());
    data.extend_from_slice(uid);

    let mut implicit = |group: u16, element: u16, value: &[u8]| {
        data.extend_from_slice(&group.to_le_bytes());
        data.extend_from_slice(&element.to_le_bytes());
        data.extend_from_slice(&(value.len() as u32).to_le_bytes());
        data.extend_from_slice(value);
    };
    implicit(0x0028, 0x0010, &4u16.to_le_bytes()); // Rows
    implicit(0x0028, 0x0011, &4u16.to_le_bytes()); // Columns
    implicit(0x0028, 0x0100, &8u16.to_le_bytes()); // Bits Allocated
    implicit(0x7FE0, 0x0010, &[7u8; 16]); // Pixel Data

    let ds = parse_dataset(&Bytes::from(data)).unwrap();
    assert_eq!(ds.rows, 4);
    assert_eq!(ds.columns, 4);
    assert_eq!(ds.bits_allocated, 8);
    assert_eq!(ds.transfer_syntax, TransferSyntax::ImplicitVrLittleEndian);
    assert_eq!(ds.pixel_data.as_ref(), &[7u8; 16]);
}

#[test]
fn test_parse_big_endian_body() {
    let mut data = vec![0u8; 128];
    data.extend_from_slice(b"DICM");

    // File meta group stays little-endian
    let uid = b"1.2.840.10008.1.2.2\0";
    data.extend_from_slice(&0x0002u16.to_le_bytes());
    data.extend_from_slice(&0x0010u16.to_le_bytes());
    data.extend_from_slice(b"UI");
    data.extend_from_slice(&(uid.len() as u16).to_le_bytes());
    data.extend_from_slice(uid);

    // Body elements big-endian
    let mut be_us = |group: u16, element: u16, value: u16| {
        data.extend_from_slice(&group.to_be_bytes());
        data.extend_from_slice(&element.to_be_bytes());
        data.extend_from_slice(b"US");
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&value.to_be_bytes());
    };
    be_us(0x0028, 0x0010, 2); // Rows
    be_us(0x0028, 0x0011, 2); // Columns
    be_us(0x0028, 0x0100, 8); // Bits Allocated

    data.extend_from_slice(&0x7FE0u16.to_be_bytes());
    data.extend_from_slice(&0x0010u16.to_be_bytes());
    data.extend_from_slice(b"OB");
    data.extend_from_slice(&[0, 0]);
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);

    let ds = parse_dataset(&Bytes::from(data)).unwrap();
    assert_eq!(ds.rows, 2);
    assert_eq!(ds.columns, 2);
    assert_eq!(ds.transfer_syntax, TransferSyntax::ExplicitVrBigEndian);
    assert_eq!(ds.pixel_data.as_ref(), &[1, 2, 3, 4]);
}

// =============================================================================
// Degraded Modes
// =============================================================================

#[test]
fn test_missing_signature_still_parses() {
    let data = DicomBuilder::without_signature()
        .us(ROWS, 2)
        .us(COLUMNS, 2)
        .us(BITS_ALLOCATED, 8)
        .element(PIXEL_DATA, b"OB", &[9; 4])
        .build();
    // Pad past the minimum size gate
    let mut padded = data;
    padded.resize(padded.len().max(132) + 8, 0);

    let ds = parse_dataset(&Bytes::from(padded)).unwrap();
    assert_eq!(ds.rows, 2);
    assert_eq!(ds.columns, 2);
}

#[test]
fn test_window_fallback_without_tags() {
    // No window tags: the effective window comes from sampled min/max
    let data = DicomBuilder::new()
        .element(TRANSFER_SYNTAX_UID, b"UI", b"1.2.840.10008.1.2.1\0")
        .us(ROWS, 2)
        .us(COLUMNS, 2)
        .us(BITS_ALLOCATED, 8)
        .element(PIXEL_DATA, b"OB", &[10, 20, 30, 40])
        .build();

    let ds = parse_dataset(&Bytes::from(data)).unwrap();
    assert!(!ds.window_from_tags);
    assert_eq!(ds.window_center, 25.0); // (10 + 40) / 2
    assert_eq!(ds.window_width, 30.0); // 40 - 10
}

#[test]
fn test_zero_width_window_falls_back() {
    let data = DicomBuilder::new()
        .element(TRANSFER_SYNTAX_UID, b"UI", b"1.2.840.10008.1.2.1\0")
        .us(ROWS, 2)
        .us(COLUMNS, 2)
        .us(BITS_ALLOCATED, 8)
        .element(WINDOW_CENTER, b"DS", b"100 ")
        .element(WINDOW_WIDTH, b"DS", b"0 ")
        .element(PIXEL_DATA, b"OB", &[50, 50, 50, 50])
        .build();

    let ds = parse_dataset(&Bytes::from(data)).unwrap();
    assert!(!ds.window_from_tags);
    // Uniform samples: width floors at 1
    assert_eq!(ds.window_center, 50.0);
    assert_eq!(ds.window_width, 1.0);
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn test_encapsulated_pixel_data_rejected() {
    // Undefined length (0xFFFFFFFF) on Pixel Data marks encapsulation
    let mut data = DicomBuilder::new()
        .element(TRANSFER_SYNTAX_UID, b"UI", b"1.2.840.10008.1.2.1\0")
        .us(ROWS, 2)
        .us(COLUMNS, 2)
        .us(BITS_ALLOCATED, 8)
        .build();
    data.extend_from_slice(&0x7FE0u16.to_le_bytes());
    data.extend_from_slice(&0x0010u16.to_le_bytes());
    data.extend_from_slice(b"OB");
    data.extend_from_slice(&[0, 0]);
    data.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

    let err = parse_dataset(&Bytes::from(data)).unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedTransferSyntax(_)));
}

#[test]
fn test_truncated_pixel_region_rejected() {
    // Pixel Data declares 64 bytes but the buffer ends after 4
    let mut data = DicomBuilder::new()
        .us(ROWS, 4)
        .us(COLUMNS, 4)
        .us(BITS_ALLOCATED, 8)
        .build();
    data.extend_from_slice(&0x7FE0u16.to_le_bytes());
    data.extend_from_slice(&0x0010u16.to_le_bytes());
    data.extend_from_slice(b"OB");
    data.extend_from_slice(&[0, 0]);
    data.extend_from_slice(&64u32.to_le_bytes());
    data.extend_from_slice(&[0; 4]);

    let err = parse_dataset(&Bytes::from(data)).unwrap_err();
    assert!(matches!(err, ParseError::OutOfBounds { .. }));
}

#[test]
fn test_multiframe_geometry_consistency() {
    let data = Bytes::from(build_study(16, 16, 16, 3, 128.0, 256.0, |_, p| p as u16));
    let ds = parse_dataset(&data).unwrap();
    assert_eq!(ds.frame_count, 3);
    assert_eq!(ds.frame_size(), 16 * 16 * 2);
    assert!(ds.geometry_consistent());
}
