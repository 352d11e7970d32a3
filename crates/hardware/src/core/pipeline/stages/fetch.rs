//! Fetch stage.
//!
//! Fetch pulls decoded instructions from the instruction source into the
//! instruction list and hands their sequence numbers to Decode. It does not
//! predict: the source always supplies the correct path, and a mispredicted
//! branch is modeled by the squash that follows its resolution.
//!
//! A thread is skipped for the cycle when:
//! - commit broadcast a squash for it last cycle,
//! - decode signalled backpressure,
//! - it is stalled for a drain,
//! - its source is exhausted,
//! - the instruction cache refuses the fetch block.

use tracing::trace;

use crate::common::{MAX_THREADS, SimResult, ThreadId};
use crate::core::pipeline::dyn_inst::DynInst;
use crate::core::pipeline::port::{MessageHandler, PortResponse, Request, RequestKind};
use crate::core::pipeline::state::CoreState;
use crate::core::pipeline::traits::PipelineStage;

/// Bytes per instruction slot, used to form fetch block addresses.
const INST_BYTES: u64 = 4;

/// Instruction fetch stage.
#[derive(Debug, Clone)]
pub struct Fetch {
    width: usize,
    running: [bool; MAX_THREADS],
    drain_stalled: [bool; MAX_THREADS],
}

impl Fetch {
    /// Stage fetching up to `width` instructions per cycle.
    pub const fn new(width: usize) -> Self {
        Self {
            width,
            running: [false; MAX_THREADS],
            drain_stalled: [false; MAX_THREADS],
        }
    }

    /// Stops fetching for `tid` until the drain completes.
    pub fn drain_stall(&mut self, tid: ThreadId) {
        self.drain_stalled[tid] = true;
    }

    /// Returns true if `tid` is stalled for a drain.
    pub fn is_drain_stalled(&self, tid: ThreadId) -> bool {
        self.drain_stalled[tid]
    }

    /// Lifts every drain stall.
    pub fn drain_resume(&mut self) {
        self.drain_stalled = [false; MAX_THREADS];
    }

    /// Resumes fetching for a thread that was suspended.
    pub fn wake_from_quiesce(&mut self, tid: ThreadId) {
        self.running[tid] = true;
    }

    /// Stops fetching for a thread that left the active list.
    pub fn deactivate_thread(&mut self, tid: ThreadId) {
        self.running[tid] = false;
    }

    /// Inherits the running threads of the stage being replaced.
    pub fn take_over_from(&mut self, old: &Self) {
        self.running = old.running;
        self.drain_stalled = [false; MAX_THREADS];
    }
}

impl PipelineStage for Fetch {
    fn tick(&mut self, state: &mut CoreState, active: &[ThreadId]) -> SimResult<()> {
        let mut budget = self.width;

        for &tid in active {
            if budget == 0 {
                break;
            }
            let feedback = state.time_buffer.wire(-1);
            let squashing = feedback.commit[tid].squash.is_some();
            let blocked = feedback.decode_block[tid];
            if squashing
                || blocked
                || self.drain_stalled[tid]
                || state.source.is_exhausted(tid)
            {
                trace!(tid, squashing, blocked, "fetch skipped");
                continue;
            }

            let req = Request {
                tid,
                seq: None,
                addr: state.source.position(tid) * INST_BYTES,
                kind: RequestKind::Fetch,
            };
            if state.icache.handle(&req) == PortResponse::Retry {
                state.stats.icache_retries += 1;
                break;
            }

            while budget > 0 {
                let Some((pos, inst)) = state.source.next(tid) else {
                    break;
                };
                let seq = state.next_seq();
                let _ = state.inst_list.insert(DynInst::new(seq, tid, pos, inst));
                state.fetch_queue.wire_mut(0).insts.push(seq);
                state.stats.fetched_insts += 1;
                state.activity.activity();
                trace!(tid, sn = seq, pos, "fetch");
                budget -= 1;
            }
        }
        Ok(())
    }

    fn is_drained(&self) -> bool {
        (0..MAX_THREADS).all(|tid| !self.running[tid] || self.drain_stalled[tid])
    }

    fn clear_states(&mut self, tid: ThreadId) {
        self.drain_stalled[tid] = false;
    }
}
