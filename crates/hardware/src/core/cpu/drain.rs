//! Drain and resume.
//!
//! Draining brings the pipeline to a state with no instruction anywhere, so the
//! core can be checkpointed or switched out. It provides:
//! 1. **Drain Request:** `drain` asks commit to stop each thread at a safe point.
//! 2. **Completion:** `try_drain`, checked at the end of every cycle.
//! 3. **Resume:** `drain_resume` restarts the active threads.
//!
//! Draining a drained core is a no-op.

use tracing::{debug, info};

use super::{Cpu, CpuStatus, ThreadStatus};
use crate::common::SimResult;
use crate::core::pipeline::traits::PipelineStage;
use crate::sim::event::CpuEvent;

/// Drain progress of a core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DrainState {
    /// Executing normally.
    #[default]
    Running,
    /// Waiting for in-flight instructions to retire or squash.
    Draining,
    /// No instruction is left anywhere in the pipeline.
    Drained,
}

impl Cpu {
    /// Starts draining the pipeline.
    ///
    /// Suspended threads are reactivated so their in-flight state can drain. When
    /// nothing is left in flight the buffers are flushed for their full depth and
    /// the core reports `Drained` at once; otherwise it keeps ticking until
    /// `try_drain` succeeds.
    pub fn drain(&mut self) -> DrainState {
        if self.drain_state == DrainState::Drained {
            return DrainState::Drained;
        }
        if self.status == CpuStatus::SwitchedOut {
            self.drain_state = DrainState::Drained;
            return DrainState::Drained;
        }

        info!("draining");
        self.commit.drain();

        for tid in 0..self.num_threads() {
            if self.thread_status[tid] == ThreadStatus::Suspended {
                debug!(tid, "reactivating suspended thread to drain it");
                self.activate_context(tid);
            }
        }

        if self.is_drained() {
            self.complete_drain();
            DrainState::Drained
        } else {
            self.drain_state = DrainState::Draining;
            self.wake_cpu();
            self.schedule_tick_now();
            self.state.activity.activity();
            DrainState::Draining
        }
    }

    /// Returns true if no instruction remains in the instruction list, the
    /// removal queue or any stage.
    pub fn is_drained(&self) -> bool {
        let stages: [&dyn PipelineStage; 5] = [
            &self.fetch,
            &self.decode,
            &self.rename,
            &self.iew,
            &self.commit,
        ];
        let mut drained = true;
        for (name, stage) in ["fetch", "decode", "rename", "iew", "commit"]
            .into_iter()
            .zip(stages)
        {
            if !stage.is_drained() {
                debug!(stage = name, "not drained");
                drained = false;
            }
        }
        if !self.state.rob.is_empty_all() {
            debug!(stage = "rob", "not drained");
            drained = false;
        }
        if !self.state.inst_list.is_empty() || self.state.inst_list.has_pending_removals() {
            debug!(insts = self.state.inst_list.len(), "instruction list not empty");
            drained = false;
        }
        drained
    }

    /// Completes a pending drain once the pipeline is empty.
    ///
    /// # Returns
    ///
    /// `true` on the cycle the core becomes drained.
    pub fn try_drain(&mut self) -> bool {
        if self.drain_state != DrainState::Draining || !self.is_drained() {
            return false;
        }
        self.complete_drain();
        true
    }

    fn complete_drain(&mut self) {
        self.state.flush_buffers();
        self.unschedule_tick();
        self.drain_state = DrainState::Drained;
        self.drain_sanity_check();
        info!(cycle = self.cur_cycle(), "drained");
    }

    /// Checks that every structure is empty after a drain.
    pub fn drain_sanity_check(&self) {
        debug_assert!(self.is_drained());
        debug_assert!(self.state.rob.is_empty_all());
        debug_assert_eq!(self.iew.iq_len(), 0);
        debug_assert!(
            self.state
                .time_buffer
                .slots()
                .all(|s| s.commit.iter().all(|c| c.squash.is_none()))
        );
        debug_assert!(self.state.fetch_queue.slots().all(|s| s.insts.is_empty()));
    }

    /// Resumes after a drain, restarting every previously active thread.
    ///
    /// Fails if the memory system is not in timing mode.
    pub fn drain_resume(&mut self) -> SimResult<()> {
        self.verify_memory_mode()?;
        debug_assert!(!self.events.is_scheduled(CpuEvent::Tick));

        self.fetch.drain_resume();
        self.commit.drain_resume();
        self.drain_state = DrainState::Running;
        self.status = CpuStatus::Idle;

        for tid in 0..self.num_threads() {
            if self.thread_status[tid] == ThreadStatus::Active {
                debug!(tid, "activating thread on resume");
                self.activate_thread(tid);
                self.fetch.wake_from_quiesce(tid);
            }
        }

        if !self.active_threads.is_empty() {
            self.wake_cpu();
            self.schedule_tick_now();
            self.status = CpuStatus::Running;
        }
        info!(threads = self.active_threads.len(), "resumed");
        Ok(())
    }
}
