use thiserror::Error;

/// I/O errors that can occur when fetching study bytes from storage.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Study not found in the configured source
    #[error("Study not found: {0}")]
    NotFound(String),

    /// Filesystem or other I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Study identifier escapes the configured root or is otherwise malformed
    #[error("Invalid study identifier: {0}")]
    InvalidId(String),
}

/// Errors that can occur when parsing a DICOM Part-10 container.
///
/// Parse failures are fatal for the whole dataset: the buffer is rejected and
/// nothing is cached. Per-frame problems live in [`DecodeError`] instead.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// Buffer is smaller than the fixed preamble plus signature
    #[error("Buffer too small: need at least {required} bytes, got {actual}")]
    TooSmallBuffer { required: usize, actual: usize },

    /// No PixelData (7FE0,0010) element was found
    #[error("Missing PixelData element (7FE0,0010)")]
    MissingPixelData,

    /// Declared pixel region lies outside the buffer
    #[error(
        "Pixel region out of bounds: offset {offset} + length {length} exceeds buffer of {buffer_len} bytes"
    )]
    OutOfBounds {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    /// Rows or Columns are zero
    #[error("Invalid geometry: {rows}x{cols}")]
    InvalidGeometry { rows: u16, cols: u16 },

    /// Pixel data is stored in a compressed/encapsulated transfer syntax
    #[error("Unsupported transfer syntax: {0} (only uncompressed pixel data is supported)")]
    UnsupportedTransferSyntax(String),

    /// Element structure is malformed beyond what the degraded pass can recover
    #[error("Malformed element at offset {offset}: {message}")]
    MalformedElement { offset: usize, message: String },
}

/// Errors that can occur when decoding or rendering a single frame.
///
/// These are scoped to one frame index and never invalidate previously cached
/// frames.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Parse error surfaced through the decode path
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Requested frame index is outside the dataset
    #[error("Frame index {index} out of range (dataset has {frame_count} frames)")]
    FrameIndexOutOfRange { index: usize, frame_count: usize },

    /// Bits Allocated value the normalizer cannot interpret at all
    #[error("Unsupported bit depth: {0} bits allocated")]
    UnsupportedBitDepth(u16),

    /// Window width must be strictly positive
    #[error("Invalid window: center {center}, width {width} (width must be > 0)")]
    InvalidWindow { center: f32, width: f32 },
}

/// Errors returned by the frame service (mapped to HTTP status codes).
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    /// Study could not be located
    #[error("Study not found: {study_id}")]
    StudyNotFound { study_id: String },

    /// Storage-layer failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Frame decode failure
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// PNG encoding failure
    #[error("Failed to encode frame: {message}")]
    Encode { message: String },

    /// Unknown window preset name
    #[error("Unknown window preset: {0}")]
    UnknownPreset(String),
}

impl From<ParseError> for FrameError {
    fn from(err: ParseError) -> Self {
        FrameError::Decode(DecodeError::Parse(err))
    }
}
