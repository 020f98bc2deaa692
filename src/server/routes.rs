//! Router configuration for the DICOM frame server.
//!
//! This module defines the HTTP routes and applies CORS and tracing
//! middleware.
//!
//! # Route Structure
//!
//! ```text
//! /health                              - Health check
//! /studies                             - List studies
//! /studies/{study_id}                  - Study metadata
//! /frames/{study_id}/{index}.png       - Rendered frame
//! /view/{study_id}                     - Embedded HTML viewer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dicom_streamer::server::routes::{create_router, RouterConfig};
//! use dicom_streamer::frame::FrameService;
//! use dicom_streamer::study::{FsStudySource, StudyRegistry};
//!
//! let source = FsStudySource::new("/data/studies");
//! let registry = StudyRegistry::new(source);
//! let frame_service = FrameService::new(registry);
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(frame_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    frame_handler, health_handler, studies_handler, study_metadata_handler, viewer_handler,
    AppState,
};
use crate::frame::FrameService;
use crate::study::StudySource;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Cine interval in milliseconds for the embedded viewer
    pub playback_interval_ms: u64,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Viewer cine interval is 100 ms
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None, // Allow any origin by default
            cache_max_age: 3600,
            playback_interval_ms: 100,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Set the embedded viewer's cine interval in milliseconds.
    pub fn with_playback_interval_ms(mut self, millis: u64) -> Self {
        self.playback_interval_ms = millis.max(1);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Health check, study listing and metadata routes
/// - Frame rendering route
/// - Embedded viewer route
/// - CORS configuration
/// - Request tracing (optional)
///
/// # Arguments
///
/// * `frame_service` - The frame service for handling render requests
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<S>(frame_service: FrameService<S>, config: RouterConfig) -> Router
where
    S: StudySource + 'static,
{
    let app_state = AppState {
        frame_service: std::sync::Arc::new(frame_service),
        cache_max_age: config.cache_max_age,
        playback_interval_ms: config.playback_interval_ms,
    };

    let cors = build_cors_layer(&config);

    // Uses {filename} to capture both "{index}" and "{index}.png" formats
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/studies", get(studies_handler::<S>))
        .route("/studies/{study_id}", get(study_metadata_handler::<S>))
        .route("/frames/{study_id}/{filename}", get(frame_handler::<S>))
        .route("/view/{study_id}", get(viewer_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            // Parse origins into HeaderValues
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
