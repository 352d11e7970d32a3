//! Thread context management.
//!
//! Hardware thread contexts share the physical register file, the ROB and the
//! instruction queue. This module moves contexts in and out of the active list.
//! It provides:
//! 1. **Activation:** `activate_context`, `suspend_context`, `halt_context`.
//! 2. **Deferred Exit:** Threads are marked halting or suspending and leave once
//!    their ROB share is empty, checked by the `ThreadExit` event.
//! 3. **Insertion and Removal:** Binding a context's registers and clearing its
//!    pipeline state.
//! 4. **Switching:** Handing every context over to another core.

use tracing::{debug, info};

use super::{Cpu, CpuStatus, DrainState};
use crate::common::{MAX_THREADS, RegClass, RegId, SimResult, ThreadId};
use crate::core::pipeline::traits::PipelineStage;
use crate::sim::event::CpuEvent;

/// Lifecycle of a thread context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThreadStatus {
    /// Fetching and executing.
    Active,
    /// Stopped; may be woken.
    Suspended,
    /// Stopped for good unless reactivated explicitly.
    #[default]
    Halted,
    /// Waiting for its ROB share to empty before halting.
    Halting,
    /// Waiting for its ROB share to empty before suspending.
    Suspending,
}

impl Cpu {
    /// Adds `tid` to the active list if it is not there yet.
    pub fn activate_thread(&mut self, tid: ThreadId) {
        debug_assert_ne!(self.status, CpuStatus::SwitchedOut);
        if !self.active_threads.contains(&tid) {
            debug!(tid, "adding to active threads list");
            self.active_threads.push(tid);
        }
    }

    /// Removes `tid` from the active list and tells fetch and commit.
    pub fn deactivate_thread(&mut self, tid: ThreadId) {
        if let Some(idx) = self.active_threads.iter().position(|t| *t == tid) {
            debug!(tid, "removing from active threads list");
            let _ = self.active_threads.remove(idx);
        }
        self.fetch.deactivate_thread(tid);
        self.commit.deactivate_thread(tid);
    }

    /// Makes `tid` runnable and, unless the core is drained, starts ticking.
    ///
    /// A drained core only records the thread as active; `drain_resume` schedules
    /// the tick.
    pub fn activate_context(&mut self, tid: ThreadId) {
        self.activate_thread(tid);
        self.thread_status[tid] = ThreadStatus::Active;

        if self.drain_state == DrainState::Drained {
            return;
        }

        let now = self.events.cur_tick();
        if self.last_activated[tid].is_none_or(|t| t < now) {
            self.schedule_tick_now();
            self.state.activity.activity();
            self.fetch.wake_from_quiesce(tid);

            let mut cycles = self.cur_cycle().saturating_sub(self.last_running_cycle);
            if cycles != 0 {
                cycles -= 1;
            }
            self.state.stats.quiesce_cycles += cycles;
            self.last_activated[tid] = Some(now);
            self.status = CpuStatus::Running;
            info!(tid, tick = now, "thread activated");
        }
    }

    /// Deactivates `tid`. The last thread to go idles the core.
    pub fn suspend_context(&mut self, tid: ThreadId) -> SimResult<()> {
        debug!(tid, "suspending thread context");
        self.deactivate_thread(tid);
        self.remove_thread(tid)?;
        self.thread_status[tid] = ThreadStatus::Suspended;

        if self.active_threads.is_empty() {
            self.unschedule_tick();
            self.last_running_cycle = self.cur_cycle();
            self.status = CpuStatus::Idle;
        }
        Ok(())
    }

    /// Deactivates `tid` for good.
    pub fn halt_context(&mut self, tid: ThreadId) -> SimResult<()> {
        debug!(tid, "halt context, deallocating");
        self.deactivate_thread(tid);
        self.remove_thread(tid)?;
        self.thread_status[tid] = ThreadStatus::Halted;
        Ok(())
    }

    /// Binds `tid`'s registers from its committed state and activates it.
    ///
    /// The speculative map restarts from the commit map, and every committed
    /// register is marked ready.
    pub fn insert_thread(&mut self, tid: ThreadId) {
        info!(tid, "initializing thread into cpu");
        debug_assert_eq!(self.state.inst_list.count_in_flight(tid), 0);
        self.state.reset_speculative_map(tid);
        self.activate_context(tid);
    }

    /// Clears every piece of `tid`'s state held by the stages and buffers.
    ///
    /// Whatever the thread still has in flight, ROB residents included, is
    /// squashed and its stream rewound, so a later activation replays it from
    /// the committed state.
    pub fn remove_thread(&mut self, tid: ThreadId) -> SimResult<()> {
        debug!(tid, "removing thread context from cpu");
        let squashed = self.state.squash_thread_after(tid, 0, None)?;
        if squashed > 0 {
            info!(tid, squashed, "squashed in-flight instructions of removed thread");
        }

        self.fetch.clear_states(tid);
        self.decode.clear_states(tid);
        self.rename.clear_states(tid);
        self.iew.clear_states(tid);
        self.iew.prune_queue(&self.state);
        self.commit.clear_states(tid);
        self.state.purge_thread_buffers(tid);
        if self.state.inst_list.has_pending_removals() {
            self.clean_up_removed_insts();
        }
        Ok(())
    }

    /// Flags a `Halting` thread to halt once its ROB share empties.
    pub fn mark_thread_ready_to_halt(&mut self, tid: ThreadId) {
        debug_assert_eq!(self.thread_status[tid], ThreadStatus::Halting);
        debug_assert!(!self.halting[tid]);
        self.halting[tid] = true;
        self.schedule_thread_exit();
    }

    /// Flags a `Suspending` thread to suspend once its ROB share empties.
    pub fn mark_thread_ready_to_suspend(&mut self, tid: ThreadId) {
        debug_assert_eq!(self.thread_status[tid], ThreadStatus::Suspending);
        debug_assert!(!self.suspending[tid]);
        self.suspending[tid] = true;
        self.schedule_thread_exit();
    }

    /// Reactivates `tid` right after its pending halt or suspend completes.
    pub fn mark_thread_to_activate(&mut self, tid: ThreadId) {
        self.to_activate[tid] = true;
    }

    fn schedule_thread_exit(&mut self) {
        if !self.events.is_scheduled(CpuEvent::ThreadExit) {
            self.events.schedule(CpuEvent::ThreadExit, self.next_cycle());
        }
    }

    /// Halts or suspends every flagged thread whose ROB share is empty.
    ///
    /// Threads still waiting for a squash to complete are checked again next cycle.
    pub fn exit_threads(&mut self) -> SimResult<()> {
        for tid in 0..self.num_threads() {
            let rob_empty = self.state.rob.is_empty(tid);
            if self.halting[tid] && rob_empty {
                self.halt_context(tid)?;
                self.halting[tid] = false;
            } else if self.suspending[tid] && rob_empty {
                self.suspend_context(tid)?;
                self.suspending[tid] = false;
            } else {
                continue;
            }
            if std::mem::take(&mut self.to_activate[tid]) {
                self.activate_context(tid);
            }
        }

        if (0..MAX_THREADS).any(|tid| self.halting[tid] || self.suspending[tid]) {
            self.schedule_thread_exit();
        }
        Ok(())
    }

    /// Rotates the active list so every thread takes turns at the front.
    pub fn update_thread_priority(&mut self) {
        if self.active_threads.len() > 1 {
            self.active_threads.rotate_left(1);
        }
    }

    /// Reactivates a suspended thread, waking the core if it was idle.
    pub fn wakeup(&mut self, tid: ThreadId) {
        if self.thread_status[tid] != ThreadStatus::Suspended {
            return;
        }
        self.wake_cpu();
        self.state.activity.activity();
        debug!(tid, "suspended thread woken");
        self.activate_context(tid);
    }

    /// Squashes every uncommitted instruction of `tid` on the next cycle, as
    /// when a thread context's state is changed from outside the pipeline.
    pub fn squash_from_tc(&mut self, tid: ThreadId) {
        self.commit.generate_tc_event(tid);
        self.wake_cpu();
    }

    /// Gives up the thread contexts. The core must be drained.
    pub fn switch_out(&mut self) {
        debug_assert_eq!(self.drain_state, DrainState::Drained);
        for tid in std::mem::take(&mut self.active_threads) {
            self.fetch.deactivate_thread(tid);
            self.commit.deactivate_thread(tid);
        }
        self.state.activity.reset();
        self.unschedule_tick();
        self.status = CpuStatus::SwitchedOut;
        info!("switched out");
    }

    /// Takes over the thread contexts of a drained, switched-out core.
    ///
    /// The instruction source, architectural register values, status registers,
    /// thread statuses and the global sequence number carry over. The core is
    /// left idle until `drain_resume`.
    pub fn take_over_from(&mut self, old: &mut Self) -> SimResult<()> {
        debug_assert!(!self.events.is_scheduled(CpuEvent::Tick));
        std::mem::swap(&mut self.state.source, &mut old.state.source);
        self.state.global_seq = old.state.global_seq;
        self.events.warp_to(old.events.cur_tick());
        self.fetch.take_over_from(&old.fetch);

        if self.state.vec_mode != old.state.vec_mode {
            self.state.switch_vec_mode(old.state.vec_mode)?;
        }

        self.status = CpuStatus::Idle;
        let threads = self.num_threads().min(old.num_threads());
        for tid in 0..threads {
            for class in RegClass::ALL {
                if class.is_vector() {
                    continue;
                }
                for index in 0..self.state.arch_regs[class.idx()] {
                    let reg = RegId::new(class, index as u16);
                    self.set_arch_reg(tid, reg, old.read_arch_reg(tid, reg)?)?;
                }
            }
            for index in 0..self.state.arch_regs[RegClass::Vec.idx()] {
                let lanes = old.read_arch_vec_reg(tid, index as u16)?;
                self.set_arch_vec_reg(tid, index as u16, &lanes)?;
            }
            self.thread_regs[tid] = old.thread_regs[tid];
            self.thread_status[tid] = old.thread_status[tid];
            if self.thread_status[tid] == ThreadStatus::Active {
                self.activate_thread(tid);
            }
        }

        self.last_running_cycle = self.cur_cycle();
        self.drain_state = DrainState::Drained;
        info!(seq = self.state.global_seq, "took over thread contexts");
        Ok(())
    }
}
