//! Main Execution Loop.
//!
//! This module implements one cycle of the core. It performs the following:
//! 1. **Stage Ordering:** Fetch, Decode, Rename, IEW and Commit tick in that order,
//!    each reading the previous cycle's output of the stage before it.
//! 2. **Commit Follow-up:** Drain stalls and vector renaming mode switches.
//! 3. **Bookkeeping:** Buffer advance, deferred instruction removal, thread exits.
//! 4. **Scheduling:** The tick is rescheduled only while there is activity.

use tracing::{debug, info};

use super::{Cpu, CpuStatus, ThreadStatus};
use crate::common::{SimError, SimResult, ThreadId};
use crate::core::pipeline::traits::PipelineStage;
use crate::sim::event::CpuEvent;

impl Cpu {
    /// Advances the pipeline by one cycle.
    ///
    /// # Returns
    ///
    /// The first fatal error raised by any stage; the pipeline state is then unspecified.
    pub fn tick(&mut self) -> SimResult<()> {
        debug_assert_ne!(self.status, CpuStatus::SwitchedOut);
        self.state.stats.cycles += 1;
        self.state.reset_ports();

        let active = self.active_threads.clone();
        self.fetch.tick(&mut self.state, &active)?;
        self.decode.tick(&mut self.state, &active)?;
        self.rename.tick(&mut self.state, &active)?;
        self.iew.tick(&mut self.state, &active)?;
        self.commit.tick(&mut self.state, &active)?;

        let outcome = self.commit.take_outcome();
        for tid in outcome.drained {
            self.fetch.drain_stall(tid);
        }
        for (tid, status) in outcome.status_writes {
            self.thread_regs[tid] = status;
            let _ = self.switch_rename_mode(tid)?;
        }

        self.check_thread_exits();

        self.state.advance_buffers();
        self.state.activity.advance();
        if self.state.inst_list.has_pending_removals() {
            self.clean_up_removed_insts();
        }

        if !self.events.is_scheduled(CpuEvent::Tick) {
            if self.status == CpuStatus::SwitchedOut {
                debug!("switched out, not rescheduling");
            } else if !self.state.activity.active() || self.status == CpuStatus::Idle {
                self.last_running_cycle = self.cur_cycle();
                self.state.stats.times_idled += 1;
                debug!(cycle = self.last_running_cycle, "idle");
            } else {
                self.events.schedule(CpuEvent::Tick, self.next_cycle());
            }
        }

        self.update_thread_priority();
        let _ = self.try_drain();
        Ok(())
    }

    /// Erases every instruction queued for removal from the instruction list.
    pub fn clean_up_removed_insts(&mut self) {
        let erased = self.state.inst_list.clean_up();
        debug!(erased, "removed instructions cleaned up");
    }

    /// Schedules the tick at the current clock edge unless it is already pending.
    pub(crate) fn schedule_tick_now(&mut self) {
        if !self.events.is_scheduled(CpuEvent::Tick) {
            self.events.schedule(CpuEvent::Tick, self.cur_cycle() * self.clock_period);
        }
    }

    /// Cancels the pending tick.
    pub(crate) fn unschedule_tick(&mut self) {
        self.events.deschedule(CpuEvent::Tick);
    }

    /// Restarts the tick of an idle core, accounting the skipped cycles as idle.
    pub fn wake_cpu(&mut self) {
        if self.state.activity.active() || self.events.is_scheduled(CpuEvent::Tick) {
            return;
        }
        let mut cycles = self.cur_cycle().saturating_sub(self.last_running_cycle);
        if cycles != 0 {
            cycles -= 1;
        }
        self.state.stats.idle_cycles += cycles;
        self.state.stats.cycles += cycles;
        self.events.schedule(CpuEvent::Tick, self.next_cycle());
        debug!(idle = cycles, "cpu woken");
    }

    /// Halts every active thread whose instructions are exhausted and retired.
    fn check_thread_exits(&mut self) {
        let done: Vec<ThreadId> = self
            .active_threads
            .iter()
            .copied()
            .filter(|tid| {
                self.thread_status[*tid] == ThreadStatus::Active
                    && self.state.source.is_exhausted(*tid)
                    && self.state.inst_list.count_in_flight(*tid) == 0
            })
            .collect();
        for tid in done {
            info!(tid, "thread finished its instruction stream");
            self.thread_status[tid] = ThreadStatus::Halting;
            self.mark_thread_ready_to_halt(tid);
        }
    }

    /// Applies the vector renaming mode implied by `tid`'s status register.
    ///
    /// Every thread shares the physical register file, so every thread's in-flight
    /// instructions are squashed before the register state is rearranged.
    ///
    /// # Returns
    ///
    /// `true` if the mode changed.
    pub fn switch_rename_mode(&mut self, tid: ThreadId) -> SimResult<bool> {
        let mode = self.isa.rename_mode(self.thread_regs[tid]);
        if mode == self.state.vec_mode {
            return Ok(false);
        }

        for t in 0..self.num_threads() {
            let _ = self.state.squash_thread_after(t, 0, None)?;
        }
        if (0..self.num_threads()).any(|t| self.state.inst_list.count_in_flight(t) > 0) {
            return Err(SimError::ModeSwitchInFlight { tid });
        }

        self.state.switch_vec_mode(mode)?;
        info!(tid, ?mode, "rename mode switched");
        Ok(true)
    }
}
