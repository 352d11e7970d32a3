//! Activity tracking for tick scheduling.
//!
//! The core keeps rescheduling its tick only while something happened within the
//! last few cycles. Stages call `activity` when they move an instruction; the
//! recorder remembers that for a window as deep as the longest inter-stage latency.

use std::collections::VecDeque;

/// Sliding window of per-cycle activity flags.
#[derive(Debug, Clone)]
pub struct ActivityRecorder {
    window: VecDeque<bool>,
    count: usize,
    current: bool,
}

impl ActivityRecorder {
    /// Recorder remembering activity for `depth` cycles.
    pub fn new(depth: usize) -> Self {
        Self {
            window: std::iter::repeat_n(false, depth.max(1)).collect(),
            count: 0,
            current: false,
        }
    }

    /// Notes activity in the current cycle.
    #[inline]
    pub fn activity(&mut self) {
        self.current = true;
    }

    /// Closes the current cycle.
    pub fn advance(&mut self) {
        if self.window.pop_front() == Some(true) {
            self.count -= 1;
        }
        self.window.push_back(self.current);
        if self.current {
            self.count += 1;
        }
        self.current = false;
    }

    /// Returns true if any cycle in the window saw activity.
    #[inline]
    pub const fn active(&self) -> bool {
        self.current || self.count > 0
    }

    /// Forgets all recorded activity.
    pub fn reset(&mut self) {
        self.window.iter_mut().for_each(|a| *a = false);
        self.count = 0;
        self.current = false;
    }
}
