//! Configuration management for the DICOM frame server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `DCMS_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use dicom_streamer::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//!
//! println!("Listening on {}:{}", config.host, config.port);
//! println!("Serving studies from {}", config.data_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! All configuration options can be set via environment variables with the `DCMS_` prefix:
//!
//! - `DCMS_HOST` - Server bind address (default: 0.0.0.0)
//! - `DCMS_PORT` - Server port (default: 3000)
//! - `DCMS_DATA_DIR` - Directory containing .dcm study files (required)
//! - `DCMS_CACHE_STUDIES` - Max parsed studies to cache (default: 8)
//! - `DCMS_CACHE_FRAMES` - Max decoded frames per study (default: 10)
//! - `DCMS_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `DCMS_PLAYBACK_INTERVAL_MS` - Viewer cine interval in ms (default: 100)
//! - `DCMS_CORS_ORIGINS` - Comma-separated allowed origins

use std::path::PathBuf;

use clap::Parser;

use crate::frame::DEFAULT_FRAME_CAPACITY;
use crate::study::DEFAULT_STUDY_CACHE_CAPACITY;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Default cine interval for the embedded viewer, in milliseconds.
pub const DEFAULT_PLAYBACK_INTERVAL_MS: u64 = 100;

// =============================================================================
// CLI Arguments
// =============================================================================

/// DICOM Streamer - A frame server for DICOM studies.
///
/// Parses uncompressed DICOM files from a local directory and serves
/// window/leveled frames as PNG over HTTP, with an embedded browser viewer.
#[derive(Parser, Debug, Clone)]
#[command(name = "dicom-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DCMS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DCMS_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory containing the study files (.dcm / .dicom).
    #[arg(long, env = "DCMS_DATA_DIR")]
    pub data_dir: PathBuf,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Maximum number of parsed studies to keep in memory.
    #[arg(long, default_value_t = DEFAULT_STUDY_CACHE_CAPACITY, env = "DCMS_CACHE_STUDIES")]
    pub cache_studies: usize,

    /// Maximum number of decoded frames to cache per study.
    #[arg(long, default_value_t = DEFAULT_FRAME_CAPACITY, env = "DCMS_CACHE_FRAMES")]
    pub cache_frames: usize,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "DCMS_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // Viewer Configuration
    // =========================================================================
    /// Cine playback interval for the embedded viewer, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PLAYBACK_INTERVAL_MS, env = "DCMS_PLAYBACK_INTERVAL_MS")]
    pub playback_interval_ms: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DCMS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("Data directory is required. Set --data-dir or DCMS_DATA_DIR".to_string());
        }

        if !self.data_dir.is_dir() {
            return Err(format!(
                "Data directory does not exist or is not a directory: {}",
                self.data_dir.display()
            ));
        }

        // Validate cache sizes
        if self.cache_studies == 0 {
            return Err("cache_studies must be greater than 0".to_string());
        }
        if self.cache_frames == 0 {
            return Err("cache_frames must be greater than 0".to_string());
        }

        if self.playback_interval_ms == 0 {
            return Err("playback_interval_ms must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
