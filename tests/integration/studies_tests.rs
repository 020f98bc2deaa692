//! Study listing and filesystem source tests.
//!
//! Tests verify:
//! - Studies listing with extension filtering and search
//! - End-to-end rendering from files on disk
//! - Path traversal rejection

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use dicom_streamer::frame::FrameService;
use dicom_streamer::study::{FsStudySource, StudyRegistry};
use dicom_streamer::{create_router, RouterConfig};

use super::test_utils::{is_valid_png, standard_study, MockStudySource};

fn mock_router(source: MockStudySource) -> axum::Router {
    let registry = StudyRegistry::new(source);
    create_router(FrameService::new(registry), RouterConfig::new())
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_studies_listing_sorted() {
    let source = MockStudySource::new()
        .with_study("b.dcm", standard_study())
        .with_study("a.dcm", standard_study());
    let router = mock_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/studies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["studies"], serde_json::json!(["a.dcm", "b.dcm"]));
}

#[tokio::test]
async fn test_studies_listing_search_filter() {
    let source = MockStudySource::new()
        .with_study("ct-chest.dcm", standard_study())
        .with_study("mr-brain.dcm", standard_study());
    let router = mock_router(source);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/studies?search=CHEST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["studies"], serde_json::json!(["ct-chest.dcm"]));
}

// =============================================================================
// Filesystem Source
// =============================================================================

#[tokio::test]
async fn test_fs_source_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ct.dcm"), standard_study()).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a study").unwrap();

    let source = FsStudySource::new(dir.path());
    let registry = StudyRegistry::new(source);
    let router = create_router(FrameService::new(registry), RouterConfig::new());

    // Only .dcm/.dicom files are listed
    let listing = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/studies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = listing.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["studies"], serde_json::json!(["ct.dcm"]));

    // And the file renders
    let frame = router
        .oneshot(
            Request::builder()
                .uri("/frames/ct.dcm/0.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(frame.status(), StatusCode::OK);
    let body = frame.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_png(&body));
}

#[tokio::test]
async fn test_fs_source_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsStudySource::new(dir.path());
    let registry = StudyRegistry::new(source);
    let router = create_router(FrameService::new(registry), RouterConfig::new());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/frames/..%2F..%2Fetc%2Fpasswd/0.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "invalid_study_id");
}
