//! Physical register readiness scoreboard.
//!
//! One ready bit per physical register, indexed by the flat register index.
//! Rename clears the bit of every freshly allocated destination, writeback sets
//! it, and issue waits until every source bit is set. Pinned registers (the
//! shared zero registers) are ready forever.

use crate::common::PhysRegId;

/// Ready bits over the whole physical register file.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    ready: Vec<bool>,
    pinned: Vec<bool>,
}

impl Scoreboard {
    /// Creates a scoreboard with every register not ready.
    pub fn new(total_regs: usize) -> Self {
        Self {
            ready: vec![false; total_regs],
            pinned: vec![false; total_regs],
        }
    }

    /// Marks `reg` ready.
    #[inline]
    pub fn set_reg(&mut self, reg: PhysRegId) {
        self.ready[reg.flat as usize] = true;
    }

    /// Marks `reg` not ready. No-op for pinned registers.
    #[inline]
    pub fn unset_reg(&mut self, reg: PhysRegId) {
        let i = reg.flat as usize;
        if !self.pinned[i] {
            self.ready[i] = false;
        }
    }

    /// Returns true once a value has been produced for `reg`.
    #[inline]
    pub fn get_reg(&self, reg: PhysRegId) -> bool {
        self.ready[reg.flat as usize]
    }

    /// Makes `reg` permanently ready.
    pub fn pin(&mut self, reg: PhysRegId) {
        let i = reg.flat as usize;
        self.pinned[i] = true;
        self.ready[i] = true;
    }
}
