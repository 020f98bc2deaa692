//! API integration tests for frame retrieval and error handling.
//!
//! Tests verify:
//! - Frame retrieval as PNG with correct headers
//! - Window query parameters and presets
//! - Error cases (missing study, out-of-range frame, compressed syntax)
//! - HTTP response codes and JSON error bodies

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use dicom_streamer::frame::FrameService;
use dicom_streamer::study::StudyRegistry;
use dicom_streamer::{create_router, RouterConfig};

use super::test_utils::{
    build_study, compressed_study, decode_png, is_valid_png, standard_study, MockStudySource,
};

fn make_router(source: MockStudySource) -> axum::Router {
    let registry = StudyRegistry::new(source);
    let frame_service = FrameService::new(registry);
    create_router(frame_service, RouterConfig::new())
}

// =============================================================================
// Basic Frame Retrieval
// =============================================================================

#[tokio::test]
async fn test_frame_retrieval_success() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let request = Request::builder()
        .uri("/frames/ct.dcm/0.png")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert!(response.headers().contains_key("cache-control"));
    assert_eq!(response.headers().get("x-frame-cache-hit").unwrap(), "false");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_png(&body), "Response should be a valid PNG");

    // The declared geometry must survive the full pipeline, and every output
    // pixel must be fully opaque.
    let (w, h, rgba) = decode_png(&body);
    assert_eq!((w, h), (256, 256));
    assert_eq!(rgba.len(), 256 * 256 * 4);
    assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));
}

#[tokio::test]
async fn test_frame_retrieval_without_png_extension() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let request = Request::builder()
        .uri("/frames/ct.dcm/2")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_frame_cache_hit_on_second_request() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let first = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/1.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.headers().get("x-frame-cache-hit").unwrap(), "false");

    let second = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/1.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.headers().get("x-frame-cache-hit").unwrap(), "true");
}

// =============================================================================
// Window Parameters
// =============================================================================

#[tokio::test]
async fn test_frame_with_explicit_window() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let default = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/0.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let default_body = default.into_body().collect().await.unwrap().to_bytes();

    let windowed = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/0.png?center=10&width=20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(windowed.status(), StatusCode::OK);
    let windowed_body = windowed.into_body().collect().await.unwrap().to_bytes();

    // A much narrower window must change the rendered output
    assert_ne!(default_body, windowed_body);
}

#[tokio::test]
async fn test_frame_with_preset() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/0.png?preset=bone")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_frame_unknown_preset_rejected() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/0.png?preset=brainstem")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "unknown_preset");
}

#[tokio::test]
async fn test_frame_invalid_window_rejected() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/0.png?center=40&width=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "invalid_window");
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_missing_study_returns_404() {
    let source = MockStudySource::new();
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/missing.dcm/0.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "not_found");
}

#[tokio::test]
async fn test_frame_out_of_range_returns_400() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    // standard_study has 5 frames (0-4)
    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/5.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "frame_out_of_range");
}

#[tokio::test]
async fn test_non_numeric_frame_index_returns_400() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/first.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compressed_study_returns_415() {
    let source = MockStudySource::new().with_study("jpeg.dcm", compressed_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/jpeg.dcm/0.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "unsupported_transfer_syntax");
}

// =============================================================================
// Other Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let source = MockStudySource::new();
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_study_metadata_endpoint() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/studies/ct.dcm")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let meta: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(meta["width"], 256);
    assert_eq!(meta["height"], 256);
    assert_eq!(meta["bits_allocated"], 16);
    assert_eq!(meta["frame_count"], 5);
    assert_eq!(meta["window_center"], 128.0);
    assert_eq!(meta["window_width"], 256.0);
    assert_eq!(meta["window_from_tags"], true);
    assert_eq!(meta["transfer_syntax"], "explicit-vr-le");
}

#[tokio::test]
async fn test_viewer_endpoint_serves_html() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/view/ct.dcm")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/frames/ct.dcm/"));
    assert!(html.contains("Play"));
}

#[tokio::test]
async fn test_viewer_missing_study_returns_404() {
    let source = MockStudySource::new();
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/view/missing.dcm")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Rendered Windowing Semantics
// =============================================================================

#[tokio::test]
async fn test_window_maps_samples_to_expected_gray() {
    // 2x2 single-frame study holding samples 0, 64, 128, 255 with a window of
    // 128/256 (min 0, max 256).
    let samples = [0u16, 64, 128, 255];
    let data = build_study(2, 2, 16, 1, 128.0, 256.0, |_, p| samples[p]);
    let source = MockStudySource::new().with_study("tiny.dcm", data);
    let router = make_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/tiny.dcm/0.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let (w, h, rgba) = decode_png(&body);
    assert_eq!((w, h), (2, 2));

    // round(v / 256 * 255)
    let expected = [0u8, 64, 128, 254];
    for (i, &gray) in expected.iter().enumerate() {
        let px = &rgba[i * 4..i * 4 + 4];
        assert_eq!(px[0], gray, "pixel {} red channel", i);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 255);
    }
}
