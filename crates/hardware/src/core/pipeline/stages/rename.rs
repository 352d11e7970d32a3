//! Rename stage.
//!
//! Maps architectural operands to physical registers and allocates the ROB
//! entry. It provides:
//! 1. **Resource Checks:** An instruction is renamed only if the free list holds
//!    enough registers of every class it writes and the ROB has room, so it is
//!    never partially renamed.
//! 2. **Operand Mapping:** Sources are looked up before destinations are
//!    written, so an instruction reading its own destination (e.g. `r1 = r1 + 4`)
//!    sees the previous producer.
//! 3. **Undo Records:** Each destination records its previous mapping for commit
//!    to free and squash to restore.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::{MAX_THREADS, RegClass, SeqNum, SimError, SimResult, ThreadId};
use crate::core::pipeline::dyn_inst::RenameRecord;
use crate::core::pipeline::state::CoreState;
use crate::core::pipeline::traits::PipelineStage;

/// Result of trying to rename one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameStatus {
    /// Destinations mapped and ROB entry allocated.
    Renamed,
    /// Not enough free registers for every destination.
    FreeListFull,
    /// No ROB entry left.
    RobFull,
}

/// Register rename stage.
#[derive(Debug, Clone)]
pub struct Rename {
    width: usize,
    queues: [VecDeque<SeqNum>; MAX_THREADS],
}

impl Rename {
    /// Stage renaming up to `width` instructions per cycle.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            queues: Default::default(),
        }
    }

    /// Renames instruction `seq` of `tid`, or reports why it cannot be renamed yet.
    ///
    /// Either every destination is renamed and the ROB entry allocated, or
    /// nothing changes.
    pub fn rename_inst(
        state: &mut CoreState,
        tid: ThreadId,
        seq: SeqNum,
    ) -> SimResult<RenameStatus> {
        let inst = state
            .inst_list
            .get(seq)
            .ok_or(SimError::InstNotFound { seq })?;
        let dests = inst.inst.dests.clone();
        let srcs = inst.inst.srcs.clone();

        let needed = Self::regs_needed(state, tid, seq)?;
        if !state.free_list.can_allocate(&needed) {
            return Ok(RenameStatus::FreeListFull);
        }
        if state.rob.num_free() == 0 {
            return Ok(RenameStatus::RobFull);
        }

        let phys_srcs = srcs
            .iter()
            .map(|src| state.rename_maps[tid].lookup(*src))
            .collect::<SimResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(dests.len());
        for dest in dests {
            let old = state.rename_maps[tid].lookup(dest)?;
            let new = if state.is_zero(old) {
                old
            } else {
                state.free_list.allocate(dest.class)?
            };
            let _ = state.rename_maps[tid].set_entry(dest, new)?;
            state.scoreboard.unset_reg(new);
            trace!(tid, sn = seq, %dest, %old, %new, "rename");
            records.push(RenameRecord {
                arch: dest,
                old,
                new,
            });
        }

        let inserted = state.rob.insert(tid, seq);
        debug_assert!(inserted);
        if let Some(inst) = state.inst_list.get_mut(seq) {
            inst.srcs = phys_srcs;
            inst.records = records;
            inst.renamed = true;
        }
        Ok(RenameStatus::Renamed)
    }

    /// Free registers per class that renaming `seq` would consume.
    fn regs_needed(
        state: &CoreState,
        tid: ThreadId,
        seq: SeqNum,
    ) -> SimResult<[usize; RegClass::COUNT]> {
        let inst = state
            .inst_list
            .get(seq)
            .ok_or(SimError::InstNotFound { seq })?;
        let map = &state.rename_maps[tid];
        let mut needed = [0; RegClass::COUNT];
        for dest in &inst.inst.dests {
            if !state.is_zero(map.lookup(*dest)?) {
                needed[dest.class.idx()] += 1;
            }
        }
        Ok(needed)
    }

    /// Fails when `seq` can never be renamed.
    ///
    /// With every ROB empty no commit or squash is left to return a register, so
    /// a stall on the free list would last forever.
    fn check_starvation(state: &CoreState, tid: ThreadId, seq: SeqNum) -> SimResult<()> {
        if !state.rob.is_empty_all() {
            return Ok(());
        }
        let needed = Self::regs_needed(state, tid, seq)?;
        match state.free_list.short_class(&needed) {
            Some(class) => Err(SimError::FreeListExhausted { class }),
            None => Ok(()),
        }
    }
}

impl PipelineStage for Rename {
    fn tick(&mut self, state: &mut CoreState, active: &[ThreadId]) -> SimResult<()> {
        for &seq in &state.decode_queue.wire(-1).insts {
            if let Some(inst) = state.inst_list.get(seq)
                && !inst.is_squashed()
            {
                self.queues[inst.tid].push_back(seq);
            }
        }

        let mut budget = self.width;
        for &tid in active {
            if state.time_buffer.wire(-1).iew_block[tid] {
                continue;
            }
            while budget > 0 {
                let Some(&seq) = self.queues[tid].front() else {
                    break;
                };
                if state.inst_list.get(seq).is_none_or(|i| i.is_squashed()) {
                    let _ = self.queues[tid].pop_front();
                    continue;
                }
                match Self::rename_inst(state, tid, seq)? {
                    RenameStatus::FreeListFull => {
                        state.stats.rename_full_stalls += 1;
                        debug!(tid, sn = seq, "rename stalled on free list");
                        Self::check_starvation(state, tid, seq)?;
                        break;
                    }
                    RenameStatus::RobFull => {
                        state.stats.rob_full_stalls += 1;
                        break;
                    }
                    RenameStatus::Renamed => {
                        let _ = self.queues[tid].pop_front();
                        state.rename_queue.wire_mut(0).insts.push(seq);
                        state.stats.renamed_insts += 1;
                        state.activity.activity();
                        budget -= 1;
                    }
                }
            }
        }

        let feedback = state.time_buffer.wire_mut(0);
        for tid in 0..state.num_threads {
            feedback.rename_block[tid] = !self.queues[tid].is_empty();
        }
        Ok(())
    }

    fn is_drained(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    fn clear_states(&mut self, tid: ThreadId) {
        self.queues[tid].clear();
    }
}
