//! Per-class detection count history.

use std::collections::VecDeque;

/// Bounded FIFO of recent per-frame detection counts for one class.
#[derive(Clone, Debug)]
pub struct DetectionHistory {
    counts: VecDeque<u32>,
    capacity: usize,
}

impl DetectionHistory {
    /// `capacity` is clamped to the supported smoothing window (3–5).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(3, 5);
        Self {
            counts: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push this frame's count, dropping the oldest entry when full.
    pub fn push(&mut self, count: u32) {
        if self.counts.len() == self.capacity {
            self.counts.pop_front();
        }
        self.counts.push_back(count);
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Mean over the last `window` entries, dividing by the full window
    /// even when fewer entries exist. A class seen for the first time
    /// therefore ramps up instead of spiking to its raw count.
    pub fn recent_mean(&self, window: usize) -> f32 {
        if window == 0 {
            return 0.0;
        }
        let sum: u32 = self
            .counts
            .iter()
            .rev()
            .take(window)
            .sum();
        sum as f32 / window as f32
    }
}
