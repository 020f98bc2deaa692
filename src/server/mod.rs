//! HTTP server layer for the DICOM frame server.
//!
//! This module provides the HTTP API for serving windowed frames from DICOM
//! studies, plus the embedded browser viewer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            GET /frames/{study_id}/{index}.png                   │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   viewer    │  │        routes           │  │
//! │  │ (requests)  │  │ (HTML page) │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod viewer;

pub use handlers::{
    frame_handler, health_handler, studies_handler, study_metadata_handler, viewer_handler,
    AppState, ErrorResponse, FramePathParams, FrameQueryParams, HealthResponse,
    StudiesQueryParams, StudiesResponse, StudyMetadataResponse,
};
pub use routes::{create_router, RouterConfig};
pub use viewer::render_viewer_html;
