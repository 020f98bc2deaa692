//! HTTP request handlers for the DICOM frame API.
//!
//! This module contains the Axum handlers for serving frames, study
//! metadata, and health checks.
//!
//! # Endpoints
//!
//! - `GET /frames/{study_id}/{index}.png` - Serve a rendered frame
//! - `GET /studies` - List available studies
//! - `GET /studies/{study_id}` - Study metadata
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{DecodeError, FrameError, ParseError, StoreError};
use crate::frame::{FrameRequest, FrameService, WindowSpec};
use crate::study::StudySource;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the frame service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: StudySource> {
    /// The frame service for processing frame requests
    pub frame_service: Arc<FrameService<S>>,

    /// Cache control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,

    /// Cine interval in milliseconds baked into the embedded viewer page
    pub playback_interval_ms: u64,
}

impl<S: StudySource> AppState<S> {
    /// Create a new application state with the given frame service.
    pub fn new(frame_service: FrameService<S>) -> Self {
        Self {
            frame_service: Arc::new(frame_service),
            cache_max_age: 3600, // 1 hour default
            playback_interval_ms: 100,
        }
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(frame_service: FrameService<S>, cache_max_age: u32) -> Self {
        Self {
            cache_max_age,
            ..Self::new(frame_service)
        }
    }
}

impl<S: StudySource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            frame_service: Arc::clone(&self.frame_service),
            cache_max_age: self.cache_max_age,
            playback_interval_ms: self.playback_interval_ms,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for frame requests.
///
/// Extracted from: `/frames/{study_id}/{filename}`
/// where `filename` is `{index}` or `{index}.png`.
#[derive(Debug, Deserialize)]
pub struct FramePathParams {
    /// Study identifier (file name under the configured source)
    pub study_id: String,

    /// Frame index with optional .png extension (e.g., "0" or "0.png")
    pub filename: String,
}

impl FramePathParams {
    /// Parse the frame index from the filename, stripping any .png extension.
    pub fn index(&self) -> Result<usize, std::num::ParseIntError> {
        let index_str = self.filename.strip_suffix(".png").unwrap_or(&self.filename);
        index_str.parse()
    }
}

/// Query parameters for frame requests.
///
/// An explicit `center`/`width` pair takes precedence over `preset`; with
/// neither, the dataset's own window applies.
#[derive(Debug, Deserialize)]
pub struct FrameQueryParams {
    /// Window center in raw sample units
    #[serde(default)]
    pub center: Option<f32>,

    /// Window width in raw sample units (must be > 0)
    #[serde(default)]
    pub width: Option<f32>,

    /// Named window preset ("soft-tissue", "bone", "lung", "calibration")
    #[serde(default)]
    pub preset: Option<String>,
}

impl FrameQueryParams {
    /// Resolve the query into a window selection.
    pub fn window_spec(&self) -> WindowSpec {
        match (self.center, self.width, &self.preset) {
            (Some(center), Some(width), _) => WindowSpec::Explicit { center, width },
            (_, _, Some(preset)) => WindowSpec::Preset(preset.clone()),
            _ => WindowSpec::Dataset,
        }
    }
}

/// Query parameters for the studies list endpoint.
#[derive(Debug, Deserialize)]
pub struct StudiesQueryParams {
    /// Search string to filter study names (case-insensitive substring match)
    #[serde(default)]
    pub search: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "frame_out_of_range")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Response from the studies list endpoint.
#[derive(Debug, Serialize)]
pub struct StudiesResponse {
    /// List of study identifiers
    pub studies: Vec<String>,
}

/// Response from the study metadata endpoint.
#[derive(Debug, Serialize)]
pub struct StudyMetadataResponse {
    /// Study identifier
    pub study_id: String,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Bits allocated per sample (8 or 16)
    pub bits_allocated: u16,

    /// Bits actually carrying data
    pub bits_stored: u16,

    /// Samples per pixel (1 for grayscale)
    pub samples_per_pixel: u16,

    /// Number of frames in the study
    pub frame_count: usize,

    /// Whether samples are signed two's complement
    pub signed: bool,

    /// Default window center
    pub window_center: f32,

    /// Default window width
    pub window_width: f32,

    /// True when the window came from the container's tags rather than the
    /// sampled fallback
    pub window_from_tags: bool,

    /// Transfer syntax name (e.g., "explicit-vr-le")
    pub transfer_syntax: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert FrameError to HTTP response.
///
/// This implementation logs errors appropriately based on their severity:
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for FrameError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            // 404 Not Found
            FrameError::StudyNotFound { study_id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Study not found: {}", study_id),
            ),

            FrameError::Store(StoreError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Study not found: {}", id),
            ),

            // 400 Bad Request - invalid parameters
            FrameError::Store(StoreError::InvalidId(id)) => (
                StatusCode::BAD_REQUEST,
                "invalid_study_id",
                format!("Invalid study identifier: {}", id),
            ),

            FrameError::Decode(DecodeError::FrameIndexOutOfRange { index, frame_count }) => (
                StatusCode::BAD_REQUEST,
                "frame_out_of_range",
                format!(
                    "Frame index {} is out of range (study has {} frames, valid range: 0-{})",
                    index,
                    frame_count,
                    frame_count.saturating_sub(1)
                ),
            ),

            FrameError::Decode(DecodeError::InvalidWindow { center, width }) => (
                StatusCode::BAD_REQUEST,
                "invalid_window",
                format!(
                    "Invalid window: center {}, width {} (width must be > 0)",
                    center, width
                ),
            ),

            FrameError::UnknownPreset(name) => (
                StatusCode::BAD_REQUEST,
                "unknown_preset",
                format!("Unknown window preset: {}", name),
            ),

            // 415 Unsupported Media Type - the container cannot be decoded
            FrameError::Decode(DecodeError::Parse(ParseError::UnsupportedTransferSyntax(
                syntax,
            ))) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_transfer_syntax",
                format!("Unsupported transfer syntax: {}", syntax),
            ),

            FrameError::Decode(DecodeError::Parse(parse_err)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "invalid_container",
                parse_err.to_string(),
            ),

            FrameError::Decode(DecodeError::UnsupportedBitDepth(bits)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_bit_depth",
                format!("Unsupported bit depth: {} bits allocated", bits),
            ),

            // 500 Internal Server Error
            FrameError::Store(StoreError::Io(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                format!("Storage error: {}", msg),
            ),

            FrameError::Encode { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encode_error",
                format!("Failed to encode frame: {}", message),
            ),
        };

        // Log errors based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            // 404s are common and expected, keep them at debug
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub FrameError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<FrameError> for HandlerError {
    fn from(err: FrameError) -> Self {
        HandlerError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle frame requests.
///
/// # Endpoint
///
/// `GET /frames/{study_id}/{index}.png`
///
/// # Path Parameters
///
/// - `study_id`: Study identifier (URL-encoded if it contains special characters)
/// - `index`: Zero-based frame index
///
/// # Query Parameters
///
/// - `center`: Window center in raw sample units (paired with `width`)
/// - `width`: Window width in raw sample units, > 0
/// - `preset`: Named window preset ("soft-tissue", "bone", "lung", "calibration")
///
/// # Response
///
/// - `200 OK`: PNG image with `Content-Type: image/png`
/// - `400 Bad Request`: Frame index out of range or invalid window
/// - `404 Not Found`: Study not found
/// - `415 Unsupported Media Type`: Compressed transfer syntax or malformed container
/// - `500 Internal Server Error`: Processing error
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Frame-Cache-Hit: true|false`
/// - `X-Frame-Degenerate: true|false`
pub async fn frame_handler<S: StudySource>(
    State(state): State<AppState<S>>,
    Path(params): Path<FramePathParams>,
    Query(query): Query<FrameQueryParams>,
) -> Result<Response, HandlerError> {
    let index = match params.index() {
        Ok(index) => index,
        Err(_) => {
            warn!(
                filename = %params.filename,
                "Frame filename is not a valid index"
            );
            let body = ErrorResponse::with_status(
                "invalid_frame_index",
                format!("Frame filename must be a non-negative integer: {}", params.filename),
                StatusCode::BAD_REQUEST,
            );
            return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
        }
    };

    let request = FrameRequest {
        study_id: params.study_id.clone(),
        frame_index: index,
        window: query.window_spec(),
    };

    let response = state.frame_service.render_frame(request).await?;

    let http_response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        )
        .header("X-Frame-Cache-Hit", response.cache_hit.to_string())
        .header("X-Frame-Degenerate", response.degenerate.to_string())
        .body(axum::body::Body::from(response.data))
        .unwrap();

    Ok(http_response)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle studies list requests.
///
/// # Endpoint
///
/// `GET /studies`
///
/// # Query Parameters
///
/// - `search`: Case-insensitive substring filter on study names
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "studies": ["ct-chest.dcm", "mr-brain.dcm"]
/// }
/// ```
pub async fn studies_handler<S: StudySource>(
    State(state): State<AppState<S>>,
    Query(query): Query<StudiesQueryParams>,
) -> Result<Json<StudiesResponse>, HandlerError> {
    let mut studies = state.frame_service.registry().list_studies().await?;

    if let Some(ref search) = query.search {
        let search_lower = search.to_lowercase();
        studies.retain(|s| s.to_lowercase().contains(&search_lower));
    }

    Ok(Json(StudiesResponse { studies }))
}

/// Handle study metadata requests.
///
/// # Endpoint
///
/// `GET /studies/{study_id}`
///
/// # Response
///
/// `200 OK` with JSON body containing study metadata:
/// ```json
/// {
///   "study_id": "ct-chest.dcm",
///   "width": 512,
///   "height": 512,
///   "bits_allocated": 16,
///   "bits_stored": 12,
///   "samples_per_pixel": 1,
///   "frame_count": 120,
///   "signed": false,
///   "window_center": 40.0,
///   "window_width": 400.0,
///   "window_from_tags": true,
///   "transfer_syntax": "explicit-vr-le"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Study not found
/// - `415 Unsupported Media Type`: Container cannot be parsed
/// - `500 Internal Server Error`: Storage error
pub async fn study_metadata_handler<S: StudySource>(
    State(state): State<AppState<S>>,
    Path(study_id): Path<String>,
) -> Result<Json<StudyMetadataResponse>, HandlerError> {
    let study = state.frame_service.registry().get_study(&study_id).await?;
    let dataset = study.dataset();

    Ok(Json(StudyMetadataResponse {
        study_id,
        width: dataset.width(),
        height: dataset.height(),
        bits_allocated: dataset.bits_allocated,
        bits_stored: dataset.bits_stored,
        samples_per_pixel: dataset.samples_per_pixel,
        frame_count: dataset.frame_count,
        signed: dataset.signed,
        window_center: dataset.window_center,
        window_width: dataset.window_width,
        window_from_tags: dataset.window_from_tags,
        transfer_syntax: dataset.transfer_syntax.name().to_string(),
    }))
}

/// Handle viewer requests - serves an HTML page with the embedded viewer.
///
/// # Endpoint
///
/// `GET /view/{study_id}`
///
/// # Response
///
/// `200 OK` with an HTML page wiring the study's frames into scrub,
/// window/level, and cine playback controls.
///
/// # Errors
///
/// - `404 Not Found`: Study not found
/// - `415 Unsupported Media Type`: Container cannot be parsed
pub async fn viewer_handler<S: StudySource>(
    State(state): State<AppState<S>>,
    Path(study_id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    // Parse the study up front so a broken container 404s/415s here instead
    // of failing inside the page
    let study = state.frame_service.registry().get_study(&study_id).await?;
    let dataset = study.dataset();

    let html = super::viewer::render_viewer_html(&study_id, dataset, state.playback_interval_ms);
    Ok(Html(html))
}

// =============================================================================
// Tests
// =============================================================================
