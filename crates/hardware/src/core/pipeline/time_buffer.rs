//! Cycle-indexed communication buffer between pipeline stages.
//!
//! A `TimeBuffer` is a ring of per-cycle payloads addressed relative to the
//! current cycle. A producer writes wire 0; after `advance` the same payload is
//! visible to the consumer at wire -1. Stages therefore always observe the
//! previous cycle's output regardless of the order they tick in.

/// Ring of per-cycle payloads with `past` cycles of history and `future` cycles of lookahead.
#[derive(Debug, Clone)]
pub struct TimeBuffer<T> {
    past: usize,
    future: usize,
    base: usize,
    data: Vec<T>,
}

impl<T: Default> TimeBuffer<T> {
    /// Creates a buffer of `past + future + 1` default payloads.
    pub fn new(past: usize, future: usize) -> Self {
        let size = past + future + 1;
        Self {
            past,
            future,
            base: 0,
            data: (0..size).map(|_| T::default()).collect(),
        }
    }

    /// Number of cycles the buffer spans.
    #[inline]
    pub const fn size(&self) -> usize {
        self.past + self.future + 1
    }

    #[inline]
    fn slot(&self, idx: isize) -> usize {
        debug_assert!(
            idx >= -(self.past as isize) && idx <= self.future as isize,
            "wire {idx} outside [-{}, {}]",
            self.past,
            self.future
        );
        (self.base as isize + idx).rem_euclid(self.data.len() as isize) as usize
    }

    /// Payload `idx` cycles from now.
    #[inline]
    pub fn wire(&self, idx: isize) -> &T {
        &self.data[self.slot(idx)]
    }

    /// Mutable payload `idx` cycles from now.
    #[inline]
    pub fn wire_mut(&mut self, idx: isize) -> &mut T {
        let slot = self.slot(idx);
        &mut self.data[slot]
    }

    /// Moves to the next cycle, recycling the oldest slot as the furthest future one.
    pub fn advance(&mut self) {
        self.base = (self.base + 1) % self.data.len();
        let recycled = self.slot(self.future as isize);
        self.data[recycled] = T::default();
    }

    /// Advances once per slot, leaving every wire at its default.
    pub fn flush(&mut self) {
        for _ in 0..self.size() {
            self.advance();
        }
    }

    /// Iterates every slot regardless of age.
    pub fn slots(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }

    /// Iterates every slot mutably regardless of age.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.data.iter_mut()
    }
}
