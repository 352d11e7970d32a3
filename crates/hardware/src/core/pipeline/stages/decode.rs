//! Decode stage.
//!
//! Instructions arrive already decoded from the source, so this stage only
//! models bandwidth and buffering: it moves up to `width` instructions per
//! cycle from per-thread skid buffers to Rename, and asks Fetch to stall while
//! a thread's skid buffer is not empty.

use std::collections::VecDeque;

use crate::common::{MAX_THREADS, SeqNum, SimResult, ThreadId};
use crate::core::pipeline::state::CoreState;
use crate::core::pipeline::traits::PipelineStage;

/// Instruction decode stage.
#[derive(Debug, Clone)]
pub struct Decode {
    width: usize,
    skid: [VecDeque<SeqNum>; MAX_THREADS],
}

impl Decode {
    /// Stage passing up to `width` instructions per cycle.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            skid: Default::default(),
        }
    }

    /// Instructions buffered for `tid`.
    pub fn buffered(&self, tid: ThreadId) -> usize {
        self.skid[tid].len()
    }
}

impl PipelineStage for Decode {
    fn tick(&mut self, state: &mut CoreState, active: &[ThreadId]) -> SimResult<()> {
        for &seq in &state.fetch_queue.wire(-1).insts {
            if let Some(inst) = state.inst_list.get(seq)
                && !inst.is_squashed()
            {
                self.skid[inst.tid].push_back(seq);
            }
        }

        let mut budget = self.width;
        for &tid in active {
            if state.time_buffer.wire(-1).rename_block[tid] {
                continue;
            }
            while budget > 0 {
                let Some(seq) = self.skid[tid].pop_front() else {
                    break;
                };
                if state.inst_list.get(seq).is_none_or(|i| i.is_squashed()) {
                    continue;
                }
                state.decode_queue.wire_mut(0).insts.push(seq);
                state.activity.activity();
                budget -= 1;
            }
        }

        let feedback = state.time_buffer.wire_mut(0);
        for tid in 0..state.num_threads {
            feedback.decode_block[tid] = !self.skid[tid].is_empty();
        }
        Ok(())
    }

    fn is_drained(&self) -> bool {
        self.skid.iter().all(VecDeque::is_empty)
    }

    fn clear_states(&mut self, tid: ThreadId) {
        self.skid[tid].clear();
    }
}
