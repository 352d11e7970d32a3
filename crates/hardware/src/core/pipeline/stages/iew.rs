//! Issue/Execute/Writeback stage.
//!
//! IEW dispatches renamed instructions into a shared instruction queue, issues
//! the oldest ready ones and executes them in a single cycle. It provides:
//! 1. **Dispatch:** Per-thread queues feeding the instruction queue, with
//!    backpressure to Rename while a queue is not empty.
//! 2. **Issue:** Oldest first, once every source register is ready on the
//!    scoreboard. Memory operations also need a data cache port.
//! 3. **Execute & Writeback:** Results are written to the destination registers,
//!    which become ready; Commit learns of completion one cycle later.
//! 4. **Branch Resolution:** Mispredicted branches are reported to Commit, which
//!    performs the squash.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::common::{MAX_THREADS, SeqNum, SimResult, ThreadId};
use crate::core::pipeline::port::{MessageHandler, PortResponse, Request, RequestKind};
use crate::core::pipeline::state::CoreState;
use crate::core::pipeline::traits::PipelineStage;
use crate::sim::source::OpClass;

/// Issue/execute/writeback stage.
#[derive(Debug, Clone)]
pub struct Iew {
    dispatch_width: usize,
    issue_width: usize,
    iq_entries: usize,
    dispatch: [VecDeque<SeqNum>; MAX_THREADS],
    iq: BTreeSet<SeqNum>,
}

impl Iew {
    /// Creates the stage.
    ///
    /// # Arguments
    ///
    /// * `dispatch_width` - Instructions moved into the queue per cycle.
    /// * `issue_width` - Instructions executed per cycle.
    /// * `iq_entries` - Capacity of the shared instruction queue.
    pub fn new(dispatch_width: usize, issue_width: usize, iq_entries: usize) -> Self {
        Self {
            dispatch_width,
            issue_width,
            iq_entries,
            dispatch: Default::default(),
            iq: BTreeSet::new(),
        }
    }

    /// Instructions waiting in the instruction queue.
    pub fn iq_len(&self) -> usize {
        self.iq.len()
    }

    /// Drops queue entries that were squashed or already removed.
    pub fn prune_queue(&mut self, state: &CoreState) {
        self.iq
            .retain(|seq| state.inst_list.get(*seq).is_some_and(|i| i.is_in_flight()));
    }

    fn dispatch(&mut self, state: &mut CoreState, active: &[ThreadId]) {
        let mut budget = self.dispatch_width;
        let mut full = false;
        for &tid in active {
            while budget > 0 {
                let Some(&seq) = self.dispatch[tid].front() else {
                    break;
                };
                if state.inst_list.get(seq).is_none_or(|i| i.is_squashed()) {
                    let _ = self.dispatch[tid].pop_front();
                    continue;
                }
                if self.iq.len() >= self.iq_entries {
                    full = true;
                    break;
                }
                let _ = self.dispatch[tid].pop_front();
                let _ = self.iq.insert(seq);
                state.activity.activity();
                budget -= 1;
            }
        }
        if full {
            state.stats.iq_full_stalls += 1;
        }
    }

    fn issue(state: &CoreState, seq: SeqNum) -> bool {
        state.inst_list.get(seq).is_some_and(|inst| {
            inst.srcs.iter().all(|src| state.scoreboard.get_reg(*src))
        })
    }

    fn execute(state: &mut CoreState, seq: SeqNum) {
        let Some(inst) = state.inst_list.get(seq) else {
            return;
        };
        let operands: u64 = inst
            .srcs
            .iter()
            .fold(0, |acc, src| acc.wrapping_add(state.regfile.read(*src)));
        let result = operands.wrapping_add(inst.inst.imm);
        let fault = inst.inst.fault;
        let dests: Vec<_> = inst.records.iter().map(|r| r.new).collect();
        let mispredicted = inst.inst.op == OpClass::Branch && inst.inst.mispredicted;

        for dest in dests {
            if fault.is_none() && !state.is_zero(dest) {
                state.regfile.set(dest, result);
            }
            state.scoreboard.set_reg(dest);
        }
        if let Some(inst) = state.inst_list.get_mut(seq) {
            inst.executed = true;
            inst.result = result;
            inst.fault = fault;
        }

        let wire = state.iew_queue.wire_mut(0);
        wire.executed.push(seq);
        if mispredicted {
            wire.mispredicts.push(seq);
            state.stats.branch_mispredicts += 1;
            debug!(sn = seq, "branch mispredicted");
        }
        trace!(sn = seq, result, ?fault, "execute");
    }
}

impl PipelineStage for Iew {
    fn tick(&mut self, state: &mut CoreState, active: &[ThreadId]) -> SimResult<()> {
        for &seq in &state.rename_queue.wire(-1).insts {
            if let Some(inst) = state.inst_list.get(seq)
                && !inst.is_squashed()
            {
                self.dispatch[inst.tid].push_back(seq);
            }
        }

        self.dispatch(state, active);
        let feedback = state.time_buffer.wire_mut(0);
        for tid in 0..state.num_threads {
            feedback.iew_block[tid] = !self.dispatch[tid].is_empty();
        }

        self.prune_queue(state);

        let mut issued = Vec::with_capacity(self.issue_width);
        let mut mem_blocked = false;
        for &seq in &self.iq {
            if issued.len() >= self.issue_width {
                break;
            }
            if !Self::issue(state, seq) {
                continue;
            }
            let Some(inst) = state.inst_list.get(seq) else {
                continue;
            };
            if inst.inst.op.is_mem_ref() {
                if mem_blocked {
                    continue;
                }
                let addr = inst
                    .srcs
                    .iter()
                    .fold(inst.inst.imm, |acc, src| acc.wrapping_add(state.regfile.read(*src)));
                let kind = if inst.inst.op == OpClass::MemWrite {
                    RequestKind::Write
                } else {
                    RequestKind::Read
                };
                let req = Request {
                    tid: inst.tid,
                    seq: Some(seq),
                    addr,
                    kind,
                };
                if state.dcache.handle(&req) == PortResponse::Retry {
                    state.stats.dcache_retries += 1;
                    mem_blocked = true;
                    continue;
                }
            }
            issued.push(seq);
        }

        for seq in issued {
            let _ = self.iq.remove(&seq);
            if let Some(inst) = state.inst_list.get_mut(seq) {
                inst.issued = true;
            }
            Self::execute(state, seq);
            state.activity.activity();
        }
        Ok(())
    }

    fn is_drained(&self) -> bool {
        self.iq.is_empty() && self.dispatch.iter().all(VecDeque::is_empty)
    }

    fn clear_states(&mut self, tid: ThreadId) {
        self.dispatch[tid].clear();
    }
}
