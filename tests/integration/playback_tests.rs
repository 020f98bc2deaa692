//! Playback integration tests over the full service stack.
//!
//! Tests drive the cine controller against a real registry and frame
//! service, using paused tokio time to make tick timing deterministic.

use std::sync::Arc;
use std::time::Duration;

use dicom_streamer::frame::FrameService;
use dicom_streamer::study::StudyRegistry;
use dicom_streamer::viewer::{Playback, PlaybackState};

use super::test_utils::{build_study, MockStudySource};

async fn make_player(frames: usize, looping: bool) -> Playback<MockStudySource> {
    let data = build_study(4, 4, 16, frames, 128.0, 256.0, |frame, p| {
        (frame * 16 + p) as u16
    });
    let source = MockStudySource::new().with_study("cine.dcm", data);
    let service = Arc::new(FrameService::new(StudyRegistry::new(source)));
    let study = service.registry().get_study("cine.dcm").await.unwrap();
    Playback::with_options(service, study, Duration::from_millis(100), looping)
}

#[tokio::test(start_paused = true)]
async fn test_playback_advances_and_wraps() {
    let player = make_player(3, true).await;

    player.go_to_frame(0).await.unwrap();
    assert!(player.play().await);

    // 100ms per tick: after 350ms the ticker fired at 100/200/300, landing
    // on frame 0 again after the wrap
    tokio::time::sleep(Duration::from_millis(350)).await;
    match player.state().await {
        PlaybackState::Playing(index) => assert_eq!(index, 0),
        other => panic!("expected playing, got {:?}", other),
    }

    player.pause().await;
}

#[tokio::test(start_paused = true)]
async fn test_playback_non_looping_stops_at_end() {
    let player = make_player(3, false).await;

    player.go_to_frame(0).await.unwrap();
    assert!(player.play().await);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(matches!(player.state().await, PlaybackState::Ready(2)));
}

#[tokio::test(start_paused = true)]
async fn test_playback_populates_frame_cache() {
    let player = make_player(3, true).await;

    player.go_to_frame(0).await.unwrap();
    player.play().await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    player.pause().await;

    let study = player.study();
    let cache = study.frames().lock().await;
    assert!(cache.contains(0));
    assert!(cache.contains(1));
    assert!(cache.contains(2));
}

#[tokio::test]
async fn test_playback_watch_channel_tracks_navigation() {
    let player = make_player(5, true).await;
    let rx = player.subscribe();

    player.go_to_frame(3).await.unwrap();
    assert_eq!(*rx.borrow(), 3);

    player.go_to_frame(1).await.unwrap();
    assert_eq!(*rx.borrow(), 1);
}

#[tokio::test]
async fn test_playback_out_of_range_goto_is_error_free() {
    let player = make_player(2, true).await;

    player.go_to_frame(1).await.unwrap();
    assert!(matches!(player.state().await, PlaybackState::Ready(1)));

    // Past the end: the call errors and state stays where it was
    assert!(player.go_to_frame(9).await.is_err());
    assert!(matches!(player.state().await, PlaybackState::Ready(1)));
}
