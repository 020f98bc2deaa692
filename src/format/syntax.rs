//! Transfer syntax identification.
//!
//! The transfer syntax UID (0002,0010) declares how the main dataset is
//! encoded: implicit vs explicit VR, byte order, and whether pixel data is
//! encapsulated in a compression codec. This viewer decodes raw pixel data
//! only; every encapsulated syntax is rejected up front with
//! [`ParseError::UnsupportedTransferSyntax`](crate::error::ParseError) so
//! compressed frames can never be silently misrendered.

use crate::error::ParseError;

/// UID for Implicit VR Little Endian (the DICOM default).
pub const UID_IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";

/// UID for Explicit VR Little Endian.
pub const UID_EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

/// UID for Explicit VR Big Endian (retired, but still found in the wild).
pub const UID_EXPLICIT_VR_BE: &str = "1.2.840.10008.1.2.2";

/// UID for Deflated Explicit VR Little Endian.
pub const UID_DEFLATED_LE: &str = "1.2.840.10008.1.2.1.99";

// =============================================================================
// TransferSyntax
// =============================================================================

/// The encoding scheme for the main dataset and its pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferSyntax {
    /// Implicit VR, little-endian values (DICOM default)
    ImplicitVrLittleEndian,

    /// Explicit VR, little-endian values
    ExplicitVrLittleEndian,

    /// Explicit VR, big-endian values
    ExplicitVrBigEndian,

    /// Any syntax this viewer does not decode (compressed, deflated, unknown)
    Unsupported(String),
}

impl TransferSyntax {
    /// Classify a transfer syntax UID string.
    ///
    /// UI values are padded to even length with a trailing NUL, which is
    /// stripped before comparison.
    pub fn from_uid(uid: &str) -> Self {
        let uid = uid.trim_end_matches(['\0', ' ']);
        match uid {
            UID_IMPLICIT_VR_LE => TransferSyntax::ImplicitVrLittleEndian,
            UID_EXPLICIT_VR_LE => TransferSyntax::ExplicitVrLittleEndian,
            UID_EXPLICIT_VR_BE => TransferSyntax::ExplicitVrBigEndian,
            other => TransferSyntax::Unsupported(other.to_string()),
        }
    }

    /// Whether the main dataset uses explicit VR element headers.
    #[inline]
    pub fn is_explicit_vr(&self) -> bool {
        !matches!(self, TransferSyntax::ImplicitVrLittleEndian)
    }

    /// Whether multi-byte values are stored big-endian.
    #[inline]
    pub fn is_big_endian(&self) -> bool {
        matches!(self, TransferSyntax::ExplicitVrBigEndian)
    }

    /// Human-readable name for diagnostic logging.
    pub fn name(&self) -> &str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => "implicit-vr-le",
            TransferSyntax::ExplicitVrLittleEndian => "explicit-vr-le",
            TransferSyntax::ExplicitVrBigEndian => "explicit-vr-be",
            TransferSyntax::Unsupported(_) => "unsupported",
        }
    }

    /// Error out if this syntax cannot carry raw pixel data.
    ///
    /// The deflated syntax compresses the whole dataset stream and the JPEG /
    /// RLE family encapsulates pixel data, so neither can reach the frame
    /// slicer.
    pub fn ensure_uncompressed(&self) -> Result<(), ParseError> {
        match self {
            TransferSyntax::Unsupported(uid) => {
                Err(ParseError::UnsupportedTransferSyntax(uid.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for TransferSyntax {
    /// Files without file meta information default to implicit VR LE.
    fn default() -> Self {
        TransferSyntax::ImplicitVrLittleEndian
    }
}

// =============================================================================
// Tests
// =============================================================================
