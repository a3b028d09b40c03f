use std::collections::{HashSet, VecDeque};
use parking_lot::Mutex;

use crate::common::types::FrameId;

struct LruState {
    /// Front = most recently unpinned, back = the coldest candidate
    order: VecDeque<FrameId>,
    /// Membership index over `order`
    tracked: HashSet<FrameId>,
}

/// LRU (Least Recently Used) replacement policy over unpinned frames.
///
/// The replacer owns its latch; callers never lock around it. It tracks frame
/// ids only, never frame references, so nothing here can dangle when a frame's
/// resident page changes.
pub struct LruReplacer {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruReplacer {
    pub fn new(pool_size: usize) -> Self {
        Self {
            capacity: pool_size,
            state: Mutex::new(LruState {
                order: VecDeque::with_capacity(pool_size),
                tracked: HashSet::with_capacity(pool_size),
            }),
        }
    }

    /// Remove and return the least recently unpinned frame, if any
    pub fn victim(&self) -> Option<FrameId> {
        let mut state = self.state.lock();

        let frame_id = state.order.pop_back()?;
        state.tracked.remove(&frame_id);
        Some(frame_id)
    }

    /// A page in this frame was pinned; it is no longer a candidate.
    /// Idempotent for untracked frames.
    pub fn pin(&self, frame_id: FrameId) {
        let mut state = self.state.lock();

        if state.tracked.remove(&frame_id) {
            if let Some(pos) = state.order.iter().position(|&id| id == frame_id) {
                state.order.remove(pos);
            }
        }
    }

    /// The frame's pin count dropped to zero; it becomes the most recent
    /// candidate. No-op when already tracked.
    pub fn unpin(&self, frame_id: FrameId) {
        let mut state = self.state.lock();

        if state.tracked.contains(&frame_id) {
            return;
        }

        // The pool's pin accounting keeps us under capacity; evicting here
        // only guards against a misbehaving caller.
        while state.order.len() >= self.capacity {
            if let Some(evicted) = state.order.pop_back() {
                state.tracked.remove(&evicted);
            }
        }

        state.order.push_front(frame_id);
        state.tracked.insert(frame_id);
    }

    /// Number of frames currently tracked
    pub fn len(&self) -> usize {
        self.state.lock().tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
