//! Frame service orchestrating the decode-and-display pipeline.
//!
//! The FrameService is the main entry point for frame requests. It
//! orchestrates:
//! - Request validation
//! - Study access via the registry
//! - Frame slicing and intensity normalization, memoized per study
//! - Window/level application
//! - PNG encoding
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         FrameService                             │
//! │  ┌──────────────────────────────────────────────────────────┐    │
//! │  │                    render_frame()                        │    │
//! │  │  1. Resolve window spec   4. Decode + cache on miss      │    │
//! │  │  2. Get study             5. Apply window/level          │    │
//! │  │  3. Check frame cache     6. Encode PNG & return         │    │
//! │  └──────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │            │
//! │           ▼                    ▼                    ▼            │
//! │    ┌────────────┐     ┌───────────────┐   ┌─────────────────┐    │
//! │    │ FrameCache │     │ StudyRegistry │   │ PngFrameEncoder │    │
//! │    └────────────┘     └───────────────┘   └─────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decode flows one way (slice -> normalize -> cache); window/level re-enters
//! against the retained raw samples on every view change without re-decoding.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::error::{DecodeError, FrameError};
use crate::study::{LoadedStudy, StudyRegistry, StudySource};

use super::encoder::PngFrameEncoder;
use super::normalize::{normalize_frame, NormalizedFrame};
use super::slicer::frame_bytes;
use super::window::{window_normalized, window_raw, WindowLevel};

// =============================================================================
// Frame Request
// =============================================================================

/// How the requested frame should be windowed.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowSpec {
    /// Use the dataset's declared window (or its sampled fallback).
    Dataset,
    /// Explicit `(center, width)` from the client.
    Explicit { center: f32, width: f32 },
    /// A named preset ("soft-tissue", "bone", "lung", "calibration").
    Preset(String),
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec::Dataset
    }
}

/// A request for one rendered frame.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// Study identifier (file name under the configured source)
    pub study_id: String,

    /// Zero-based frame index
    pub frame_index: usize,

    /// Window/level selection
    pub window: WindowSpec,
}

impl FrameRequest {
    /// Create a request rendered with the dataset's own window.
    pub fn new(study_id: impl Into<String>, frame_index: usize) -> Self {
        Self {
            study_id: study_id.into(),
            frame_index,
            window: WindowSpec::Dataset,
        }
    }

    /// Create a request with an explicit window.
    pub fn with_window(study_id: impl Into<String>, frame_index: usize, center: f32, width: f32) -> Self {
        Self {
            study_id: study_id.into(),
            frame_index,
            window: WindowSpec::Explicit { center, width },
        }
    }
}

// =============================================================================
// Frame Response
// =============================================================================

/// Response from the frame service.
#[derive(Debug, Clone)]
pub struct FrameResponse {
    /// PNG-encoded frame
    pub data: Bytes,

    /// Whether the decode came from the frame cache
    pub cache_hit: bool,

    /// True when the frame's samples were uniform and a placeholder
    /// gradient was rendered instead
    pub degenerate: bool,
}

// =============================================================================
// Frame Service
// =============================================================================

/// Service for decoding, windowing, and encoding frames.
///
/// # Type Parameters
///
/// * `S` - The study source type (e.g., filesystem-backed)
///
/// # Example
///
/// ```ignore
/// use dicom_streamer::frame::{FrameService, FrameRequest};
/// use dicom_streamer::study::{FsStudySource, StudyRegistry};
///
/// let registry = StudyRegistry::new(FsStudySource::new("/data/studies"));
/// let service = FrameService::new(registry);
///
/// let response = service.render_frame(FrameRequest::new("ct.dcm", 0)).await?;
/// println!("PNG: {} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
pub struct FrameService<S: StudySource> {
    /// The study registry for dataset access
    registry: Arc<StudyRegistry<S>>,

    /// PNG encoder
    encoder: PngFrameEncoder,
}

impl<S: StudySource> FrameService<S> {
    /// Create a new frame service owning its registry.
    pub fn new(registry: StudyRegistry<S>) -> Self {
        Self {
            registry: Arc::new(registry),
            encoder: PngFrameEncoder::new(),
        }
    }

    /// Create a new frame service sharing an existing registry.
    pub fn with_shared_registry(registry: Arc<StudyRegistry<S>>) -> Self {
        Self {
            registry,
            encoder: PngFrameEncoder::new(),
        }
    }

    /// Render a frame as PNG, applying the requested window.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The study cannot be found or parsed
    /// - The frame index is out of range (the cache is left untouched)
    /// - The window is invalid or the preset name unknown
    /// - PNG encoding fails
    pub async fn render_frame(&self, request: FrameRequest) -> Result<FrameResponse, FrameError> {
        let study = self.registry.get_study(&request.study_id).await?;
        // Resolve the window before any decode so a bad request cannot
        // populate the frame cache
        let window = self.resolve_window(&study, &request.window)?;

        let (normalized, cache_hit) = self.decoded_frame(&study, request.frame_index).await?;

        // A degenerate frame renders its placeholder as-is; windowing a
        // uniform frame would just produce a blank canvas again
        let rendered = if normalized.degenerate {
            normalized.clone()
        } else {
            self.windowed_frame(&study, request.frame_index, &normalized, window)?
        };

        let data = self.encoder.encode(&rendered)?;
        Ok(FrameResponse {
            data,
            cache_hit,
            degenerate: normalized.degenerate,
        })
    }

    /// Fetch the decoded (normalized) frame, consulting the study's cache.
    ///
    /// Returns the frame and whether it was served from cache. Out-of-range
    /// indices fail before any cache mutation.
    pub async fn decoded_frame(
        &self,
        study: &LoadedStudy,
        frame_index: usize,
    ) -> Result<(NormalizedFrame, bool), FrameError> {
        let dataset = study.dataset();
        // Range check up front; frame_bytes repeats it but this keeps the
        // no-mutation-on-error guarantee obvious
        if frame_index >= dataset.frame_count {
            return Err(FrameError::Decode(DecodeError::FrameIndexOutOfRange {
                index: frame_index,
                frame_count: dataset.frame_count,
            }));
        }

        let mut frames = study.frames().lock().await;
        if let Some(cached) = frames.get(frame_index) {
            return Ok((cached.clone(), true));
        }

        let raw = frame_bytes(dataset, frame_index).map_err(FrameError::Decode)?;
        let frame = normalize_frame(dataset, &raw);
        debug!(
            frame_index,
            degenerate = frame.degenerate,
            cached = frames.len(),
            "decoded frame"
        );
        frames.put(frame_index, frame.clone());
        Ok((frame, false))
    }

    /// Apply a window, preferring the frame's raw samples over the
    /// already-quantized normalized buffer.
    fn windowed_frame(
        &self,
        study: &LoadedStudy,
        frame_index: usize,
        normalized: &NormalizedFrame,
        window: WindowLevel,
    ) -> Result<NormalizedFrame, FrameError> {
        let dataset = study.dataset();
        let raw = frame_bytes(dataset, frame_index).map_err(FrameError::Decode)?;
        match window_raw(dataset, &raw, window) {
            Ok(frame) => Ok(frame),
            // Sample depth the raw path cannot interpret: re-window the
            // normalized buffer at reduced fidelity
            Err(DecodeError::UnsupportedBitDepth(_)) => {
                Ok(window_normalized(normalized, window))
            }
            Err(e) => Err(FrameError::Decode(e)),
        }
    }

    fn resolve_window(
        &self,
        study: &LoadedStudy,
        spec: &WindowSpec,
    ) -> Result<WindowLevel, FrameError> {
        match spec {
            WindowSpec::Dataset => Ok(WindowLevel::from_dataset(study.dataset())),
            WindowSpec::Explicit { center, width } => {
                WindowLevel::new(*center, *width).map_err(FrameError::Decode)
            }
            WindowSpec::Preset(name) => WindowLevel::preset(name)
                .ok_or_else(|| FrameError::UnknownPreset(name.clone())),
        }
    }

    /// Get a reference to the underlying registry.
    pub fn registry(&self) -> &Arc<StudyRegistry<S>> {
        &self.registry
    }
}

// =============================================================================
// Tests
// =============================================================================
