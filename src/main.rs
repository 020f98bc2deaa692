//! DICOM Streamer - A frame server for DICOM studies.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dicom_streamer::{
    config::Config,
    frame::FrameService,
    server::{create_router, RouterConfig},
    study::{FsStudySource, StudyRegistry, StudySource},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Data directory: {}", config.data_dir.display());
    info!(
        "  Cache: {} studies, {} frames/study",
        config.cache_studies, config.cache_frames
    );

    // Create study source and count available studies
    let source = FsStudySource::new(&config.data_dir);
    match source.list().await {
        Ok(studies) => {
            info!("  Found {} study file(s)", studies.len());
        }
        Err(e) => {
            error!("Failed to read data directory: {}", e);
            return ExitCode::FAILURE;
        }
    }

    // Create registry and frame service
    let registry = StudyRegistry::with_capacity(source, config.cache_studies, config.cache_frames);
    let frame_service = FrameService::new(registry);

    // Build router
    let router_config = build_router_config(&config);
    let router = create_router(frame_service, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/studies", addr);
    info!("");
    info!("  View a study in your browser:");
    info!("    open http://{}/view/<study_id>", addr);
    info!("");
    info!("  Fetch a frame directly:");
    info!("    curl http://{}/frames/<study_id>/0.png", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dicom_streamer=debug,tower_http=debug"
    } else {
        "dicom_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_playback_interval_ms(config.playback_interval_ms);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
