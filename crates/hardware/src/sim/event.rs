//! Discrete-event scheduling.
//!
//! The core never loops on its own: it schedules its next tick and its thread
//! exit checks as events, and simply does not schedule a tick while idle. It provides:
//! 1. **Events:** `CpuEvent`, the events a core schedules for itself.
//! 2. **Queue:** `EventQueue`, a min-heap on (tick, insertion order).
//!
//! An event is scheduled at most once. Descheduling leaves the heap entry in place
//! and invalidates it, so stale entries are skipped when they surface.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

/// Events a core schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CpuEvent {
    /// Advance the pipeline by one cycle.
    Tick,
    /// Halt or suspend threads whose instructions have all retired.
    ThreadExit,
}

/// Pending events ordered by tick, then by scheduling order.
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<(u64, u64, E)>>,
    pending: HashMap<E, (u64, u64)>,
    cur_tick: u64,
    order: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            cur_tick: 0,
            order: 0,
        }
    }
}

impl<E: Copy + Eq + Hash + Ord> EventQueue<E> {
    /// Creates an empty queue at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    #[inline]
    pub const fn cur_tick(&self) -> u64 {
        self.cur_tick
    }

    /// Schedules `event` at `when`, replacing an earlier scheduling of it.
    ///
    /// Times in the past are clamped to the current tick.
    pub fn schedule(&mut self, event: E, when: u64) {
        let when = when.max(self.cur_tick);
        let order = self.order;
        self.order += 1;
        let _ = self.pending.insert(event, (when, order));
        self.heap.push(Reverse((when, order, event)));
    }

    /// Cancels `event` if it is scheduled.
    pub fn deschedule(&mut self, event: E) {
        let _ = self.pending.remove(&event);
    }

    /// Returns true if `event` is pending.
    pub fn is_scheduled(&self, event: E) -> bool {
        self.pending.contains_key(&event)
    }

    /// Tick `event` is scheduled for, if pending.
    pub fn when(&self, event: E) -> Option<u64> {
        self.pending.get(&event).map(|(when, _)| *when)
    }

    /// Returns true if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pops the earliest pending event and moves time to it.
    pub fn service_one(&mut self) -> Option<(u64, E)> {
        while let Some(Reverse((when, order, event))) = self.heap.pop() {
            if self.pending.get(&event) == Some(&(when, order)) {
                let _ = self.pending.remove(&event);
                self.cur_tick = when;
                return Some((when, event));
            }
        }
        None
    }

    /// Moves time forward to `tick` without servicing anything.
    pub fn warp_to(&mut self, tick: u64) {
        self.cur_tick = self.cur_tick.max(tick);
    }
}
