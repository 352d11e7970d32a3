//! Physical register free list.
//!
//! One FIFO queue of unallocated physical registers per register class, plus a
//! bitmap over the flat register index space. It provides:
//! 1. **Allocation:** `allocate` hands out the oldest free register of a class.
//! 2. **Release:** `release` returns a register and rejects double frees.
//! 3. **Accounting:** Per-class free counts for rename stalls and leak checks.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::{PhysRegId, RegClass, SimError, SimResult};

/// Free physical registers, per class.
#[derive(Debug, Clone)]
pub struct FreeList {
    queues: [VecDeque<PhysRegId>; RegClass::COUNT],
    /// Indexed by flat register index.
    free: Vec<bool>,
}

impl FreeList {
    /// Creates an empty free list over `total_regs` flat indices.
    pub fn new(total_regs: usize) -> Self {
        Self {
            queues: Default::default(),
            free: vec![false; total_regs],
        }
    }

    /// Takes the oldest free register of `class`.
    pub fn allocate(&mut self, class: RegClass) -> SimResult<PhysRegId> {
        let reg = self.queues[class.idx()]
            .pop_front()
            .ok_or(SimError::FreeListExhausted { class })?;
        self.free[reg.flat as usize] = false;
        trace!(%reg, "allocate");
        Ok(reg)
    }

    /// Returns a register to its class queue.
    pub fn release(&mut self, reg: PhysRegId) -> SimResult<()> {
        let slot = &mut self.free[reg.flat as usize];
        if *slot {
            return Err(SimError::DoubleFree { reg });
        }
        *slot = true;
        self.queues[reg.class.idx()].push_back(reg);
        trace!(%reg, "release");
        Ok(())
    }

    /// Free registers of `class`.
    #[inline]
    pub fn num_free(&self, class: RegClass) -> usize {
        self.queues[class.idx()].len()
    }

    /// Returns true if `reg` is currently free.
    #[inline]
    pub fn is_free(&self, reg: PhysRegId) -> bool {
        self.free[reg.flat as usize]
    }

    /// Returns true if every count in `needed` (indexed by class) can be satisfied.
    pub fn can_allocate(&self, needed: &[usize; RegClass::COUNT]) -> bool {
        self.short_class(needed).is_none()
    }

    /// First class holding fewer free registers than `needed` asks for.
    pub fn short_class(&self, needed: &[usize; RegClass::COUNT]) -> Option<RegClass> {
        RegClass::ALL
            .iter()
            .copied()
            .find(|c| self.num_free(*c) < needed[c.idx()])
    }

    /// Empties the queue of `class`, returning the registers it held.
    ///
    /// Used when a vector mode switch retires one addressing view wholesale.
    pub fn take_class(&mut self, class: RegClass) -> Vec<PhysRegId> {
        let regs: Vec<PhysRegId> = self.queues[class.idx()].drain(..).collect();
        for reg in &regs {
            self.free[reg.flat as usize] = false;
        }
        regs
    }
}
