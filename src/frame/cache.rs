//! Bounded FIFO cache of decoded frames.
//!
//! Multi-frame studies can carry hundreds of frames; decoding each one on
//! every navigation step would make scrubbing unusable. The cache memoizes
//! a small number of [`NormalizedFrame`]s per loaded dataset and evicts in
//! strict insertion order. Lookups never refresh an entry's position.
//!
//! Implemented as an explicit key queue plus a lookup table so the eviction
//! order is owned by this type rather than inherited from a map's iteration
//! behavior.

use std::collections::{HashMap, VecDeque};

use super::normalize::NormalizedFrame;

/// Default number of frames retained per dataset.
pub const DEFAULT_FRAME_CAPACITY: usize = 10;

/// Insertion-order bounded cache of normalized frames, keyed by frame index.
#[derive(Debug)]
pub struct FrameCache {
    capacity: usize,
    // Keys in insertion order; front is next to evict.
    order: VecDeque<usize>,
    entries: HashMap<usize, NormalizedFrame>,
}

impl FrameCache {
    /// Create a cache holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Fetch a cached frame. Lookup does not affect eviction order.
    pub fn get(&self, index: usize) -> Option<&NormalizedFrame> {
        self.entries.get(&index)
    }

    /// Insert a frame, evicting the oldest-inserted entry at capacity.
    ///
    /// Re-inserting an existing index replaces the frame in place without
    /// refreshing its queue position.
    pub fn put(&mut self, index: usize, frame: NormalizedFrame) {
        if self.entries.insert(index, frame).is_some() {
            return;
        }
        self.order.push_back(index);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// Drop every entry. Called when a new dataset replaces the old one.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_CAPACITY)
    }
}
