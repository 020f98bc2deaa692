//! Cache behavior tests across the registry and frame cache layers.
//!
//! Tests verify:
//! - Parsed studies are fetched once and reused
//! - Study LRU eviction forces a re-fetch
//! - Per-study frame cache evicts in insertion order
//! - Re-decoding an evicted frame is pixel-identical

use std::sync::atomic::Ordering;
use std::sync::Arc;

use dicom_streamer::frame::{FrameRequest, FrameService};
use dicom_streamer::study::StudyRegistry;

use super::test_utils::{build_study, standard_study, MockStudySource};

fn ramp_study(frames: usize) -> Vec<u8> {
    build_study(8, 8, 16, frames, 128.0, 256.0, |frame, p| {
        ((p * 3 + frame * 11) % 256) as u16
    })
}

// =============================================================================
// Study Registry Caching
// =============================================================================

#[tokio::test]
async fn test_study_fetched_once_across_requests() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let fetches = source.fetch_counter();
    let service = FrameService::new(StudyRegistry::new(source));

    for index in 0..3 {
        service
            .render_frame(FrameRequest::new("ct.dcm", index))
            .await
            .unwrap();
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_study_lru_eviction_refetches() {
    let source = MockStudySource::new()
        .with_study("a.dcm", ramp_study(1))
        .with_study("b.dcm", ramp_study(1));
    let fetches = source.fetch_counter();

    // Capacity 1: loading b evicts a
    let service = FrameService::new(StudyRegistry::with_capacity(source, 1, 4));

    service
        .render_frame(FrameRequest::new("a.dcm", 0))
        .await
        .unwrap();
    service
        .render_frame(FrameRequest::new("b.dcm", 0))
        .await
        .unwrap();
    service
        .render_frame(FrameRequest::new("a.dcm", 0))
        .await
        .unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_load() {
    let source = MockStudySource::new().with_study("ct.dcm", standard_study());
    let fetches = source.fetch_counter();
    let service = Arc::new(FrameService::new(StudyRegistry::new(source)));

    let mut handles = Vec::new();
    for index in 0..5 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .render_frame(FrameRequest::new("ct.dcm", index))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Frame Cache Eviction Order
// =============================================================================

#[tokio::test]
async fn test_frame_cache_evicts_in_insertion_order() {
    let source = MockStudySource::new().with_study("ct.dcm", ramp_study(5));
    let registry = StudyRegistry::with_capacity(source, 4, 3);
    let service = FrameService::new(registry);

    // Fill the 3-slot cache with frames 0..3, then insert 3 and 4
    for index in 0..5 {
        service
            .render_frame(FrameRequest::new("ct.dcm", index))
            .await
            .unwrap();
    }

    let study = service.registry().get_study("ct.dcm").await.unwrap();
    let cache = study.frames().lock().await;

    // Insertion order eviction: 0 and 1 are gone, 2..5 remain
    assert!(!cache.contains(0));
    assert!(!cache.contains(1));
    assert!(cache.contains(2));
    assert!(cache.contains(3));
    assert!(cache.contains(4));
}

#[tokio::test]
async fn test_hit_does_not_extend_lifetime() {
    let source = MockStudySource::new().with_study("ct.dcm", ramp_study(4));
    let registry = StudyRegistry::with_capacity(source, 4, 2);
    let service = FrameService::new(registry);

    // Fill with 0, 1; hit 0; inserting 2 must still evict 0 first
    for index in [0usize, 1, 0, 2] {
        service
            .render_frame(FrameRequest::new("ct.dcm", index))
            .await
            .unwrap();
    }

    let study = service.registry().get_study("ct.dcm").await.unwrap();
    let cache = study.frames().lock().await;
    assert!(!cache.contains(0));
    assert!(cache.contains(1));
    assert!(cache.contains(2));
}

#[tokio::test]
async fn test_evicted_frame_redecodes_identically() {
    let source = MockStudySource::new().with_study("ct.dcm", ramp_study(5));
    let registry = StudyRegistry::with_capacity(source, 4, 2);
    let service = FrameService::new(registry);

    let first = service
        .render_frame(FrameRequest::new("ct.dcm", 0))
        .await
        .unwrap();
    assert!(!first.cache_hit);

    // Push frame 0 out of the 2-slot cache
    for index in 1..4 {
        service
            .render_frame(FrameRequest::new("ct.dcm", index))
            .await
            .unwrap();
    }

    let again = service
        .render_frame(FrameRequest::new("ct.dcm", 0))
        .await
        .unwrap();
    assert!(!again.cache_hit);
    assert_eq!(first.data, again.data);
}

#[tokio::test]
async fn test_invalidate_drops_study_and_frames() {
    let source = MockStudySource::new().with_study("ct.dcm", ramp_study(2));
    let fetches = source.fetch_counter();
    let service = FrameService::new(StudyRegistry::new(source));

    service
        .render_frame(FrameRequest::new("ct.dcm", 0))
        .await
        .unwrap();
    service.registry().invalidate("ct.dcm").await;

    let response = service
        .render_frame(FrameRequest::new("ct.dcm", 0))
        .await
        .unwrap();
    assert!(!response.cache_hit);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}
