//! Simulation statistics collection.
//!
//! This module tracks performance counters of the out-of-order core. It provides:
//! 1. **Cycles:** Active, idle and quiesced cycles, and how often the core went idle.
//! 2. **Throughput:** Committed instructions and operations per thread, and derived IPC.
//! 3. **Speculation:** Squashed instructions, branch mispredictions and faults taken.
//! 4. **Stalls:** Rename stalls on free registers or ROB space, and cache port retries.
//!
//! Counters are plain integers; formatting them is left to the caller.

use crate::common::{MAX_THREADS, ThreadId};

/// Core performance counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuStats {
    /// Cycles the core ticked.
    pub cycles: u64,
    /// Cycles skipped while the core had no work.
    pub idle_cycles: u64,
    /// Cycles spent with every thread suspended.
    pub quiesce_cycles: u64,
    /// Times the core stopped scheduling its tick.
    pub times_idled: u64,
    /// Committed instructions per thread.
    pub committed_insts: [u64; MAX_THREADS],
    /// Committed operations per thread.
    pub committed_ops: [u64; MAX_THREADS],
    /// Instructions fetched.
    pub fetched_insts: u64,
    /// Instructions renamed.
    pub renamed_insts: u64,
    /// Instructions squashed before commit.
    pub squashed_insts: u64,
    /// Rename stalls for lack of free physical registers.
    pub rename_full_stalls: u64,
    /// Rename stalls for lack of ROB space.
    pub rob_full_stalls: u64,
    /// Dispatch stalls for lack of instruction queue space.
    pub iq_full_stalls: u64,
    /// Branches that resolved as mispredicted.
    pub branch_mispredicts: u64,
    /// Faults taken at commit.
    pub faults: u64,
    /// Vector renaming mode switches.
    pub mode_switches: u64,
    /// Instruction cache port refusals.
    pub icache_retries: u64,
    /// Data cache port refusals.
    pub dcache_retries: u64,
}

impl CpuStats {
    /// Instructions committed by every thread.
    pub fn total_insts(&self) -> u64 {
        self.committed_insts.iter().sum()
    }

    /// Operations committed by every thread.
    pub fn total_ops(&self) -> u64 {
        self.committed_ops.iter().sum()
    }

    /// Committed instructions per active cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.total_insts() as f64 / self.cycles as f64
        }
    }

    /// Committed instructions per active cycle for one thread.
    pub fn thread_ipc(&self, tid: ThreadId) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.committed_insts[tid] as f64 / self.cycles as f64
        }
    }
}
