//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB records, per thread, the sequence numbers of renamed instructions in
//! program order. The instructions themselves live in the instruction list; the
//! ROB only orders them. It provides:
//! 1. **Insertion:** Appends renamed instructions while shared capacity remains.
//! 2. **Retirement:** Pops the oldest instruction of a thread at commit.
//! 3. **Squash:** Drops every entry younger than a sequence number.
//! 4. **Queries:** Head/tail/emptiness per thread, the anchors for squash and drain.

use std::collections::VecDeque;

use crate::common::{SeqNum, ThreadId};

/// Reorder buffer with per-thread program-order lists and shared capacity.
#[derive(Debug, Clone)]
pub struct Rob {
    threads: Vec<VecDeque<SeqNum>>,
    capacity: usize,
    count: usize,
}

impl Rob {
    /// Creates an empty ROB for `num_threads` threads sharing `capacity` entries.
    pub fn new(num_threads: usize, capacity: usize) -> Self {
        Self {
            threads: vec![VecDeque::new(); num_threads],
            capacity,
            count: 0,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of occupied entries across all threads.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no thread has an entry.
    #[inline]
    pub const fn is_empty_all(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of free slots.
    #[inline]
    pub const fn num_free(&self) -> usize {
        self.capacity - self.count
    }

    /// Entries held by `tid`.
    #[inline]
    pub fn thread_len(&self, tid: ThreadId) -> usize {
        self.threads[tid].len()
    }

    /// Returns true if `tid` has no entry.
    #[inline]
    pub fn is_empty(&self, tid: ThreadId) -> bool {
        self.threads[tid].is_empty()
    }

    /// Appends `seq` to `tid`'s list. Returns false if the ROB is full.
    pub fn insert(&mut self, tid: ThreadId, seq: SeqNum) -> bool {
        if self.count == self.capacity {
            return false;
        }
        debug_assert!(self.threads[tid].back().is_none_or(|t| *t < seq));
        self.threads[tid].push_back(seq);
        self.count += 1;
        true
    }

    /// Oldest instruction of `tid`.
    #[inline]
    pub fn head(&self, tid: ThreadId) -> Option<SeqNum> {
        self.threads[tid].front().copied()
    }

    /// Youngest instruction of `tid`.
    #[inline]
    pub fn tail(&self, tid: ThreadId) -> Option<SeqNum> {
        self.threads[tid].back().copied()
    }

    /// Removes and returns the oldest instruction of `tid`.
    pub fn retire_head(&mut self, tid: ThreadId) -> Option<SeqNum> {
        let seq = self.threads[tid].pop_front()?;
        self.count -= 1;
        Some(seq)
    }

    /// Drops every entry of `tid` younger than `seq`. Returns how many were dropped.
    pub fn squash_after(&mut self, tid: ThreadId, seq: SeqNum) -> usize {
        let list = &mut self.threads[tid];
        let keep = list.partition_point(|s| *s <= seq);
        let dropped = list.len() - keep;
        list.truncate(keep);
        self.count -= dropped;
        dropped
    }

    /// Entries of `tid`, oldest first.
    pub fn iter(&self, tid: ThreadId) -> impl DoubleEndedIterator<Item = SeqNum> + '_ {
        self.threads[tid].iter().copied()
    }
}
