//! # DICOM Streamer
//!
//! A frame server for DICOM studies stored on the local filesystem.
//!
//! This library parses uncompressed DICOM Part-10 files, slices multi-frame
//! pixel data into zero-copy frame views, applies window/level mapping, and
//! serves the result as PNG over HTTP with an embedded browser viewer.
//!
//! ## Features
//!
//! - **Tolerant parsing**: Explicit and implicit VR, both byte orders, with a
//!   degraded tag-scan pass for malformed containers
//! - **Zero-copy frames**: Frame views are sliced out of the pixel buffer
//!   without copying
//! - **Window/level**: Dataset defaults, named presets, and explicit
//!   center/width per request, applied to retained raw samples
//! - **Multi-level caching**: Parsed studies (LRU) and decoded frames (FIFO)
//! - **Cine playback**: Cancellable frame ticker with configurable speed
//! - **Built-in web viewer**: Scrub, window, and play studies in the browser
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`mod@format`] - DICOM parsing: tags, transfer syntaxes, datasets
//! - [`frame`] - Frame slicing, normalization, windowing, caching, encoding
//! - [`study`] - Study source and registry
//! - [`viewer`] - Playback state machine and viewport transforms
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use dicom_streamer::{create_router, FrameService, FsStudySource, RouterConfig, StudyRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = FsStudySource::new("/data/studies");
//!     let registry = StudyRegistry::new(source);
//!     let frame_service = FrameService::new(registry);
//!
//!     let router = create_router(frame_service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod server;
pub mod study;
pub mod viewer;

// Re-export commonly used types
pub use config::Config;
pub use error::{DecodeError, FrameError, ParseError, StoreError};
pub use format::{has_dicm_signature, parse_dataset, DicomDataset, Tag, TransferSyntax};
pub use frame::{
    frame_bytes, normalize_frame, window_normalized, window_raw, FrameCache, FrameRequest,
    FrameResponse, FrameService, NormalizedFrame, PngFrameEncoder, WindowLevel, WindowSpec,
    DEFAULT_FRAME_CAPACITY, PRESETS,
};
pub use server::{
    create_router, frame_handler, health_handler, studies_handler, study_metadata_handler,
    viewer_handler, AppState, ErrorResponse, FramePathParams, FrameQueryParams, HealthResponse,
    RouterConfig, StudiesQueryParams, StudiesResponse, StudyMetadataResponse,
};
pub use study::{
    FsStudySource, LoadedStudy, StudyRegistry, StudySource, DEFAULT_STUDY_CACHE_CAPACITY,
};
pub use viewer::{
    composite, Playback, PlaybackState, ViewerState, Viewport, DEFAULT_PLAYBACK_INTERVAL, MAX_ZOOM,
    MIN_ZOOM,
};
