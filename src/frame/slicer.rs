//! Frame byte-range arithmetic.
//!
//! The pixel-sample region of a multi-frame dataset is one contiguous
//! buffer; this module carves out the sub-range belonging to a single
//! frame index as a zero-copy [`Bytes`] view.

use bytes::Bytes;

use crate::error::DecodeError;
use crate::format::DicomDataset;

/// Return the raw byte slice for a zero-based frame index.
///
/// The slice shares the dataset's underlying buffer; no pixel bytes are
/// copied. The last frame may be shorter than nominal when the region
/// length is not evenly divisible by the frame count.
///
/// # Errors
///
/// `FrameIndexOutOfRange` when `index >= frame_count` or the computed
/// start offset falls past the end of the pixel region.
pub fn frame_bytes(dataset: &DicomDataset, index: usize) -> Result<Bytes, DecodeError> {
    if index >= dataset.frame_count {
        return Err(DecodeError::FrameIndexOutOfRange {
            index,
            frame_count: dataset.frame_count,
        });
    }

    let frame_size = dataset.frame_size();
    let start = index * frame_size;
    if start >= dataset.pixel_data.len() {
        return Err(DecodeError::FrameIndexOutOfRange {
            index,
            frame_count: dataset.frame_count,
        });
    }
    let end = (start + frame_size).min(dataset.pixel_data.len());

    Ok(dataset.pixel_data.slice(start..end))
}
