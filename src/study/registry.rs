//! Study registry for managing dataset lifecycle and caching.
//!
//! The registry provides:
//! - LRU caching of parsed datasets so navigation does not re-parse the
//!   container on every request
//! - Singleflight pattern so concurrent requests for the same study trigger
//!   exactly one fetch-and-parse
//! - A per-study frame cache, created with the dataset and dropped with it
//!
//! Evicting a study drops its dataset and frame cache together, which is
//! the wholesale invalidation the pipeline relies on: a reloaded study
//! always starts with an empty frame cache.

use std::collections::HashMap;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::info;

use crate::error::{FrameError, StoreError};
use crate::format::{parse_dataset, DicomDataset};
use crate::frame::{FrameCache, DEFAULT_FRAME_CAPACITY};

use super::source::StudySource;

// =============================================================================
// Configuration
// =============================================================================

/// Default number of parsed studies held in memory.
pub const DEFAULT_STUDY_CACHE_CAPACITY: usize = 8;

// =============================================================================
// LoadedStudy
// =============================================================================

/// A parsed study held in memory: the immutable dataset plus its mutable
/// frame cache.
///
/// The dataset is never mutated after parse; the frame cache is the only
/// shared mutable state and is guarded by its own lock so concurrent frame
/// requests for the same study serialize only around cache access.
pub struct LoadedStudy {
    dataset: DicomDataset,
    frames: Mutex<FrameCache>,
}

impl LoadedStudy {
    pub fn new(dataset: DicomDataset, frame_capacity: usize) -> Self {
        Self {
            dataset,
            frames: Mutex::new(FrameCache::new(frame_capacity)),
        }
    }

    pub fn dataset(&self) -> &DicomDataset {
        &self.dataset
    }

    /// The study's frame cache. Insertion and eviction happen under this
    /// lock as one atomic step.
    pub fn frames(&self) -> &Mutex<FrameCache> {
        &self.frames
    }
}

// =============================================================================
// StudyRegistry
// =============================================================================

/// Registry of loaded studies with LRU eviction and singleflight loading.
pub struct StudyRegistry<S: StudySource> {
    source: S,
    cache: RwLock<LruCache<String, Arc<LoadedStudy>>>,
    in_flight: Mutex<HashMap<String, Arc<InFlightState>>>,
    frame_capacity: usize,
}

/// State for an in-flight study load.
struct InFlightState {
    notify: Notify,
    result: Mutex<Option<Result<Arc<LoadedStudy>, FrameError>>>,
}

impl<S: StudySource> StudyRegistry<S> {
    /// Create a registry with default capacities (8 studies, 10 frames each).
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_STUDY_CACHE_CAPACITY, DEFAULT_FRAME_CAPACITY)
    }

    /// Create a registry with explicit study and per-study frame capacities.
    pub fn with_capacity(source: S, study_capacity: usize, frame_capacity: usize) -> Self {
        let study_capacity = study_capacity.max(1);
        Self {
            source,
            cache: RwLock::new(LruCache::new(
                std::num::NonZeroUsize::new(study_capacity)
                    .unwrap_or(std::num::NonZeroUsize::MIN),
            )),
            in_flight: Mutex::new(HashMap::new()),
            frame_capacity,
        }
    }

    /// Get a study, loading and parsing it if not already cached.
    ///
    /// Concurrent callers for the same identifier share one load.
    pub async fn get_study(&self, study_id: &str) -> Result<Arc<LoadedStudy>, FrameError> {
        // Fast path: check cache
        {
            let mut cache = self.cache.write().await;
            if let Some(study) = cache.get(study_id) {
                return Ok(study.clone());
            }
        }

        // Slow path: join an in-flight load or become the leader
        loop {
            let state = {
                let mut in_flight = self.in_flight.lock().await;

                if let Some(state) = in_flight.get(study_id) {
                    state.clone()
                } else {
                    let state = Arc::new(InFlightState {
                        notify: Notify::new(),
                        result: Mutex::new(None),
                    });
                    in_flight.insert(study_id.to_string(), state.clone());
                    drop(in_flight);

                    let result = self.load_study_internal(study_id).await;

                    {
                        let mut result_guard = state.result.lock().await;
                        *result_guard = Some(result.clone());
                    }

                    if let Ok(ref study) = result {
                        let mut cache = self.cache.write().await;
                        cache.put(study_id.to_string(), study.clone());
                    }

                    {
                        let mut in_flight = self.in_flight.lock().await;
                        in_flight.remove(study_id);
                    }
                    state.notify.notify_waiters();

                    return result;
                }
            };

            state.notify.notified().await;

            let result_guard = state.result.lock().await;
            if let Some(ref result) = *result_guard {
                return result.clone();
            }
        }
    }

    /// Fetch and parse a study without caching.
    async fn load_study_internal(&self, study_id: &str) -> Result<Arc<LoadedStudy>, FrameError> {
        let buffer = self.source.fetch(study_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => FrameError::StudyNotFound {
                study_id: study_id.to_string(),
            },
            other => FrameError::Store(other),
        })?;

        let dataset = parse_dataset(&buffer)?;
        info!(
            study_id,
            width = dataset.width(),
            height = dataset.height(),
            frames = dataset.frame_count,
            bits = dataset.bits_allocated,
            syntax = dataset.transfer_syntax.name(),
            "loaded study"
        );

        Ok(Arc::new(LoadedStudy::new(dataset, self.frame_capacity)))
    }

    /// List the identifiers available from the underlying source.
    pub async fn list_studies(&self) -> Result<Vec<String>, FrameError> {
        self.source.list().await.map_err(FrameError::Store)
    }

    /// Remove a study (and its frame cache) from memory.
    pub async fn invalidate(&self, study_id: &str) {
        let mut cache = self.cache.write().await;
        cache.pop(study_id);
    }

    /// Drop every loaded study.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// Number of studies currently held in memory.
    pub async fn loaded_count(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
