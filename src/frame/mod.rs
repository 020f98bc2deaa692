//! Frame decode-and-display pipeline.
//!
//! This module owns everything between a parsed dataset and the PNG bytes
//! sent to the browser:
//!
//! ```text
//! DicomDataset ──slicer──► raw bytes ──normalize──► NormalizedFrame
//!                                                        │
//!                                  FrameCache (FIFO) ◄───┤
//!                                                        │
//!                raw samples ──window/level──► display buffer ──encoder──► PNG
//! ```
//!
//! Decoding runs once per frame index; window/level changes re-enter the
//! pipeline at the transform stage without touching the parser or slicer.

pub mod cache;
pub mod encoder;
pub mod normalize;
pub mod service;
pub mod slicer;
pub mod window;

pub use cache::{FrameCache, DEFAULT_FRAME_CAPACITY};
pub use encoder::PngFrameEncoder;
pub use normalize::{normalize_frame, NormalizedFrame};
pub use service::{FrameRequest, FrameResponse, FrameService, WindowSpec};
pub use slicer::frame_bytes;
pub use window::{window_normalized, window_raw, WindowLevel, PRESETS};
