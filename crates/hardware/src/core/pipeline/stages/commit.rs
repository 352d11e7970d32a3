//! Commit stage.
//!
//! Commit retires instructions from each thread's ROB head in program order and
//! is the only stage that squashes. It provides:
//! 1. **Retirement:** Up to `width` instructions per cycle, round robin over the
//!    active threads. Retiring frees each destination's previous mapping.
//! 2. **Squash Triggers:** Branch mispredictions reported by IEW, faults at the
//!    ROB head, and squash requests from a thread context.
//! 3. **Status Writes:** A committed status register write ends the thread's
//!    cycle and is reported to the CPU, which may switch vector renaming modes.
//! 4. **Drain:** While a drain is pending, each thread stops at a safe point,
//!    discards everything younger and is reported as drained.

use tracing::{debug, info};

use crate::common::{MAX_THREADS, SeqNum, SimError, SimResult, ThreadId};
use crate::core::pipeline::state::CoreState;
use crate::core::pipeline::traits::PipelineStage;
use crate::sim::source::OpClass;

/// What commit reports to the CPU at the end of a cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Threads that reached their drain safe point this cycle.
    pub drained: Vec<ThreadId>,
    /// Status register writes committed this cycle.
    pub status_writes: Vec<(ThreadId, u64)>,
}

/// Result of trying to retire one thread's ROB head.
enum Head {
    Committed(SeqNum),
    Blocked,
}

/// Instruction commit stage.
#[derive(Debug, Clone)]
pub struct Commit {
    width: usize,
    trace: bool,
    drain_pending: bool,
    drained: [bool; MAX_THREADS],
    tc_squash: [bool; MAX_THREADS],
    outcome: CommitOutcome,
}

impl Commit {
    /// Stage retiring up to `width` instructions per cycle.
    ///
    /// With `trace` set, every retirement is logged at info level.
    pub const fn new(width: usize, trace: bool) -> Self {
        Self {
            width,
            trace,
            drain_pending: false,
            drained: [false; MAX_THREADS],
            tc_squash: [false; MAX_THREADS],
            outcome: CommitOutcome {
                drained: Vec::new(),
                status_writes: Vec::new(),
            },
        }
    }

    /// Starts a drain: each thread stops at its next safe point.
    pub fn drain(&mut self) {
        self.drain_pending = true;
    }

    /// Returns true while a drain is in progress.
    pub const fn is_drain_pending(&self) -> bool {
        self.drain_pending
    }

    /// Returns true once `tid` has reached its drain safe point.
    pub fn is_thread_drained(&self, tid: ThreadId) -> bool {
        self.drained[tid]
    }

    /// Ends the drain.
    pub fn drain_resume(&mut self) {
        self.drain_pending = false;
        self.drained = [false; MAX_THREADS];
    }

    /// Requests a squash of every uncommitted instruction of `tid` next cycle.
    pub fn generate_tc_event(&mut self, tid: ThreadId) {
        self.tc_squash[tid] = true;
    }

    /// Forgets `tid`'s pending requests when it leaves the active list.
    pub fn deactivate_thread(&mut self, tid: ThreadId) {
        self.tc_squash[tid] = false;
    }

    /// Takes the report of the last cycle.
    pub fn take_outcome(&mut self) -> CommitOutcome {
        std::mem::take(&mut self.outcome)
    }

    fn commit_head(&mut self, state: &mut CoreState, tid: ThreadId) -> SimResult<Head> {
        let Some(seq) = state.rob.head(tid) else {
            return Ok(Head::Blocked);
        };
        let inst = state
            .inst_list
            .get(seq)
            .ok_or(SimError::InstNotFound { seq })?;
        if !inst.can_commit {
            return Ok(Head::Blocked);
        }
        let pos = inst.pos;
        let op = inst.inst.op;
        let imm = inst.inst.imm;

        if let Some(fault) = inst.fault {
            debug!(tid, sn = seq, %fault, "fault at commit");
            state.stats.faults += 1;
            let _ = state.squash_thread_after(tid, seq - 1, Some(pos + 1))?;
            return Ok(Head::Blocked);
        }

        state.commit_inst(tid, seq)?;
        if self.trace {
            info!(target: "o3sim::commit", tid, sn = seq, pos, ?op, "CM");
        }
        state.time_buffer.wire_mut(0).commit[tid].done_seq = Some(seq);

        if op == OpClass::WriteStatus {
            let _ = state.squash_thread_after(tid, seq, Some(pos + 1))?;
            self.outcome.status_writes.push((tid, imm));
            return Ok(Head::Blocked);
        }
        Ok(Head::Committed(seq))
    }

    fn handle_mispredicts(state: &mut CoreState) -> SimResult<()> {
        let mut oldest: [Option<(SeqNum, u64)>; MAX_THREADS] = [None; MAX_THREADS];
        for &seq in &state.iew_queue.wire(-1).mispredicts {
            let Some(inst) = state.inst_list.get(seq) else {
                continue;
            };
            if !inst.is_in_flight() {
                continue;
            }
            let slot = &mut oldest[inst.tid];
            if slot.is_none_or(|(s, _)| seq < s) {
                *slot = Some((seq, inst.pos));
            }
        }
        for (tid, branch) in oldest.into_iter().enumerate() {
            if let Some((seq, pos)) = branch {
                let _ = state.squash_thread_after(tid, seq, Some(pos + 1))?;
            }
        }
        Ok(())
    }
}

impl PipelineStage for Commit {
    fn tick(&mut self, state: &mut CoreState, active: &[ThreadId]) -> SimResult<()> {
        for &seq in &state.iew_queue.wire(-1).executed {
            if let Some(inst) = state.inst_list.get_mut(seq)
                && inst.is_in_flight()
            {
                inst.can_commit = true;
            }
        }

        for tid in 0..state.num_threads {
            if std::mem::take(&mut self.tc_squash[tid]) {
                let _ = state.squash_thread_after(tid, 0, None)?;
            }
        }
        Self::handle_mispredicts(state)?;

        let mut committed = 0;
        let mut blocked = [false; MAX_THREADS];
        let mut youngest: [Option<SeqNum>; MAX_THREADS] = [None; MAX_THREADS];
        'retire: loop {
            let mut progress = false;
            for &tid in active {
                if committed >= self.width {
                    break 'retire;
                }
                if blocked[tid] {
                    continue;
                }
                match self.commit_head(state, tid)? {
                    Head::Committed(seq) => {
                        committed += 1;
                        youngest[tid] = Some(seq);
                        progress = true;
                    }
                    Head::Blocked => blocked[tid] = true,
                }
            }
            if !progress {
                break;
            }
        }
        if committed > 0 {
            state.activity.activity();
        }

        if self.drain_pending {
            for &tid in active {
                if self.drained[tid] {
                    continue;
                }
                let squashed = match youngest[tid] {
                    Some(seq) => state.squash_thread_after(tid, seq, None)?,
                    None => state.remove_insts_not_in_rob(tid)?,
                };
                self.drained[tid] = true;
                self.outcome.drained.push(tid);
                debug!(tid, squashed, "drain safe point");
            }
        }
        Ok(())
    }

    fn is_drained(&self) -> bool {
        self.tc_squash.iter().all(|s| !s)
    }

    fn clear_states(&mut self, tid: ThreadId) {
        self.tc_squash[tid] = false;
        self.drained[tid] = false;
    }
}
