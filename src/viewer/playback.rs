//! Playback and navigation state machine.
//!
//! Sequencing frame loads for manual stepping and timed cine playback.
//! Playback is an explicit state machine driven by a cancellable scheduled
//! task rather than a bare callback timer, so rapid play/pause toggling
//! cannot leave a dangling ticker running.
//!
//! State transitions:
//!
//! ```text
//!            go_to_frame(i)
//!   Idle ───────────────────► Loading(i) ──ok──► Ready(i)
//!                                 │                │  ▲
//!                               error            play  pause / end
//!                                 ▼                ▼  │
//!                               Error           Playing(i) ──tick──► Loading(i+1) ...
//! ```
//!
//! A decode failure anywhere transitions to `Error`, stops the ticker, and
//! surfaces the error to the caller. A `go_to_frame` issued while an earlier
//! load is still in flight wins: the earlier load's state update is dropped,
//! though its cache write still lands for later reuse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::FrameError;
use crate::frame::{FrameService, NormalizedFrame};
use crate::study::{LoadedStudy, StudySource};

/// Default cine interval between frames.
pub const DEFAULT_PLAYBACK_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// State
// =============================================================================

/// Playback controller state.
#[derive(Debug, Clone)]
pub enum PlaybackState {
    /// No frame loaded yet
    Idle,
    /// A frame load is in flight
    Loading(usize),
    /// A frame is loaded and displayed
    Ready(usize),
    /// Cine playback is advancing from this frame
    Playing(usize),
    /// A decode failed; playback stopped
    Error(FrameError),
}

impl PlaybackState {
    /// The frame index this state refers to, if any.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            PlaybackState::Loading(i) | PlaybackState::Ready(i) | PlaybackState::Playing(i) => {
                Some(*i)
            }
            PlaybackState::Idle | PlaybackState::Error(_) => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }
}

// =============================================================================
// Playback Controller
// =============================================================================

struct Inner<S: StudySource> {
    service: Arc<FrameService<S>>,
    study: Arc<LoadedStudy>,
    state: Mutex<PlaybackState>,
    interval: Mutex<Duration>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    // Monotonic load sequence; a load only publishes its result if no newer
    // load started meanwhile (last call wins)
    load_seq: AtomicU64,
    looping: bool,
    // Broadcasts the currently displayed frame index to renderers
    current_tx: watch::Sender<usize>,
}

/// Sequences frame loads for one study: manual stepping plus timed cine.
///
/// Cheap to clone; clones share the same state machine.
pub struct Playback<S: StudySource> {
    inner: Arc<Inner<S>>,
}

impl<S: StudySource> Clone for Playback<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: StudySource + 'static> Playback<S> {
    /// Create a controller for a loaded study. Looping playback by default.
    pub fn new(service: Arc<FrameService<S>>, study: Arc<LoadedStudy>) -> Self {
        Self::with_options(service, study, DEFAULT_PLAYBACK_INTERVAL, true)
    }

    pub fn with_options(
        service: Arc<FrameService<S>>,
        study: Arc<LoadedStudy>,
        interval: Duration,
        looping: bool,
    ) -> Self {
        let (current_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                service,
                study,
                state: Mutex::new(PlaybackState::Idle),
                interval: Mutex::new(interval),
                ticker: Mutex::new(None),
                load_seq: AtomicU64::new(0),
                looping,
                current_tx,
            }),
        }
    }

    /// Current state snapshot.
    pub async fn state(&self) -> PlaybackState {
        self.inner.state.lock().await.clone()
    }

    /// Number of frames in the controlled study.
    pub fn frame_count(&self) -> usize {
        self.inner.study.dataset().frame_count
    }

    /// The controlled study.
    pub fn study(&self) -> &Arc<LoadedStudy> {
        &self.inner.study
    }

    /// Watch the currently displayed frame index.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.inner.current_tx.subscribe()
    }

    /// Navigate to a frame: decode (or hit the cache) and become `Ready`.
    ///
    /// # Errors
    ///
    /// `FrameIndexOutOfRange` for indices outside the study; decode errors
    /// transition the controller to `Error` and stop playback.
    pub async fn go_to_frame(&self, index: usize) -> Result<NormalizedFrame, FrameError> {
        let seq = self.inner.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Self::load(&self.inner, index, seq, false).await
    }

    /// Start cine playback. Returns `false` when not in `Ready`.
    pub async fn play(&self) -> bool {
        {
            let mut state = self.inner.state.lock().await;
            match *state {
                PlaybackState::Ready(i) => *state = PlaybackState::Playing(i),
                _ => return false,
            }
        }
        self.spawn_ticker().await;
        true
    }

    /// Stop cine playback and return to `Ready`. Cancellation is immediate;
    /// an in-flight decode still completes into the cache but is not shown.
    pub async fn pause(&self) {
        self.cancel_ticker().await;
        let mut state = self.inner.state.lock().await;
        if let PlaybackState::Playing(i) | PlaybackState::Loading(i) = *state {
            *state = PlaybackState::Ready(i);
        }
    }

    /// Change the cine interval. Takes effect immediately when playing.
    pub async fn set_speed(&self, interval: Duration) {
        *self.inner.interval.lock().await = interval;
        let playing = self.inner.state.lock().await.is_playing();
        if playing {
            self.cancel_ticker().await;
            self.spawn_ticker().await;
        }
    }

    async fn spawn_ticker(&self) {
        let interval = *self.inner.interval.lock().await;
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick of a tokio interval fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;

                let current = match *inner.state.lock().await {
                    PlaybackState::Playing(i) => i,
                    _ => break,
                };
                let frame_count = inner.study.dataset().frame_count;
                let next = (current + 1) % frame_count;
                if next == 0 && !inner.looping {
                    let mut state = inner.state.lock().await;
                    if state.is_playing() {
                        *state = PlaybackState::Ready(current);
                    }
                    debug!(frame = current, "cine reached final frame");
                    break;
                }

                let seq = inner.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
                if Self::load(&inner, next, seq, true).await.is_err() {
                    // load() already moved the state machine to Error
                    break;
                }
            }
        });

        let mut ticker_slot = self.inner.ticker.lock().await;
        if let Some(old) = ticker_slot.replace(handle) {
            old.abort();
        }
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.inner.ticker.lock().await.take() {
            handle.abort();
        }
    }

    /// Shared load path for manual navigation and cine ticks.
    async fn load(
        inner: &Arc<Inner<S>>,
        index: usize,
        seq: u64,
        keep_playing: bool,
    ) -> Result<NormalizedFrame, FrameError> {
        let frame_count = inner.study.dataset().frame_count;
        if index >= frame_count {
            // Out-of-range is a caller mistake, not a dataset failure; the
            // state machine stays where it was
            return Err(FrameError::Decode(
                crate::error::DecodeError::FrameIndexOutOfRange { index, frame_count },
            ));
        }

        {
            let mut state = inner.state.lock().await;
            *state = PlaybackState::Loading(index);
        }

        let result = inner.service.decoded_frame(&inner.study, index).await;

        // A newer load superseded this one; drop the state update (the
        // cache write above already happened and stays)
        if inner.load_seq.load(Ordering::SeqCst) != seq {
            return result.map(|(frame, _)| frame);
        }

        match result {
            Ok((frame, cache_hit)) => {
                let mut state = inner.state.lock().await;
                *state = if keep_playing {
                    PlaybackState::Playing(index)
                } else {
                    PlaybackState::Ready(index)
                };
                drop(state);
                let _ = inner.current_tx.send(index);
                debug!(index, cache_hit, "navigated to frame");
                Ok(frame)
            }
            Err(err) => {
                warn!(index, error = %err, "frame load failed, stopping playback");
                let mut state = inner.state.lock().await;
                *state = PlaybackState::Error(err.clone());
                Err(err)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
