//! Viewer-side state: playback sequencing and viewport geometry.
//!
//! Everything here sits downstream of the frame pipeline. The [`Playback`]
//! controller decides *which* frame is current; the [`Viewport`] decides
//! *where* its pixels land. Neither touches pixel values.

pub mod playback;
pub mod viewport;

pub use playback::{Playback, PlaybackState, DEFAULT_PLAYBACK_INTERVAL};
pub use viewport::{composite, Viewport, MAX_ZOOM, MIN_ZOOM};

use crate::frame::WindowLevel;

/// All user-adjustable view parameters, threaded explicitly through render
/// calls instead of living in shared module state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    /// Currently displayed frame
    pub frame_index: usize,
    /// Active window/level
    pub window: WindowLevel,
    /// Presentation geometry
    pub viewport: Viewport,
}

impl ViewerState {
    /// Initial state for a dataset: frame 0, the dataset's window, and an
    /// identity viewport.
    pub fn for_dataset(dataset: &crate::format::DicomDataset) -> Self {
        Self {
            frame_index: 0,
            window: WindowLevel::from_dataset(dataset),
            viewport: Viewport::default(),
        }
    }
}
