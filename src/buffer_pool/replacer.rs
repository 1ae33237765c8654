use core::fmt::Debug;

use priority_queue::PriorityQueue;

use super::FrameId;

pub(super) trait Replacer: Send + Sync + Debug {
    /// Remove and return the least-recently-unpinned frame, if any.
    fn victim(&mut self) -> Option<FrameId>;
    /// Drop the frame from the eviction candidates; no-op if absent.
    fn pin(&mut self, frame_id: FrameId);
    /// Register the frame as an eviction candidate; no-op if present.
    fn unpin(&mut self, frame_id: FrameId);
    fn size(&self) -> usize;
    #[cfg(test)]
    fn peek(&self) -> Option<FrameId>;
    #[cfg(test)]
    fn contains(&self, frame_id: FrameId) -> bool;
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug)]
pub(super) struct LRU {
    timestamp: i64,
    capacity: usize,
    /// Priorities are negated timestamps, so the queue head is the frame
    /// that was unpinned earliest.
    heap: PriorityQueue<FrameId, i64>,
}

impl LRU {
    pub fn new(capacity: usize) -> Self {
        Self {
            timestamp: 0,
            capacity,
            heap: PriorityQueue::with_capacity(capacity),
        }
    }
}

impl Replacer for LRU {
    fn victim(&mut self) -> Option<FrameId> {
        self.heap.pop().map(|(frame_id, _)| frame_id)
    }

    fn pin(&mut self, frame_id: FrameId) {
        self.heap.remove(&frame_id);
    }

    fn unpin(&mut self, frame_id: FrameId) {
        if self.heap.get(&frame_id).is_some() {
            return;
        }
        // Each frame appears at most once and only unpinned frames enter,
        // so the structure can never outgrow the frame count.
        assert!(
            self.heap.len() < self.capacity,
            "replacer overflow: frame {} would be candidate {}",
            frame_id,
            self.capacity + 1
        );
        self.timestamp += 1;
        self.heap.push(frame_id, -self.timestamp);
    }

    fn size(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    fn peek(&self) -> Option<FrameId> {
        self.heap.peek().map(|(frame_id, _)| *frame_id)
    }

    #[cfg(test)]
    fn contains(&self, frame_id: FrameId) -> bool {
        self.heap.get(&frame_id).is_some()
    }
}
