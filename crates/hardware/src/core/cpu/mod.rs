//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which owns the out-of-order
//! pipeline and everything it shares. It coordinates the following:
//! 1. **Pipeline Control:** Ticks the five stages in order and advances their buffers.
//! 2. **Thread Management:** Activation, suspension, halting and priority rotation.
//! 3. **Drain Protocol:** Orderly shutdown of the pipeline and resumption.
//! 4. **Register Access:** Architectural values through the commit rename map.

/// Drain and resume.
pub mod drain;

/// Per-cycle execution.
pub mod execution;

/// Architectural and physical register access.
pub mod regs;

/// Thread context management.
pub mod threads;

use tracing::info;

use crate::common::{MAX_THREADS, SimError, SimResult, ThreadId};
use crate::config::{Config, MemoryMode};
use crate::core::pipeline::stages::{Commit, Decode, Fetch, Iew, Rename};
use crate::core::pipeline::state::CoreState;
use crate::isa::RegisterIsa;
use crate::sim::event::{CpuEvent, EventQueue};
use crate::sim::source::InstSource;
use crate::stats::CpuStats;

pub use drain::DrainState;
pub use threads::ThreadStatus;

/// Scheduling status of the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CpuStatus {
    /// The tick is scheduled or will be on the next wake-up.
    #[default]
    Running,
    /// No thread is active; the tick is not scheduled.
    Idle,
    /// Another core has taken over the threads.
    SwitchedOut,
}

/// Out-of-order CPU core.
#[derive(Debug)]
pub struct Cpu {
    /// Structures shared by the stages.
    pub state: CoreState,
    /// Fetch stage.
    pub fetch: Fetch,
    /// Decode stage.
    pub decode: Decode,
    /// Rename stage.
    pub rename: Rename,
    /// Issue/execute/writeback stage.
    pub iew: Iew,
    /// Commit stage.
    pub commit: Commit,
    /// Register capabilities of the instruction set.
    pub isa: Box<dyn RegisterIsa>,
    /// Pending tick and thread-exit events.
    pub events: EventQueue<CpuEvent>,
    /// Ticks per cycle.
    pub clock_period: u64,
    /// Scheduling status.
    pub status: CpuStatus,
    /// Drain progress.
    pub drain_state: DrainState,
    /// Status of every thread context.
    pub thread_status: Vec<ThreadStatus>,
    /// Status register of every thread context.
    pub thread_regs: Vec<u64>,
    /// Active threads in priority order.
    pub active_threads: Vec<ThreadId>,
    halting: [bool; MAX_THREADS],
    suspending: [bool; MAX_THREADS],
    to_activate: [bool; MAX_THREADS],
    last_activated: [Option<u64>; MAX_THREADS],
    last_running_cycle: u64,
    memory_mode: MemoryMode,
    workload_threads: usize,
}

impl Cpu {
    /// Creates a core with its register state initialized for every thread context.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated simulator configuration.
    /// * `isa` - Register capabilities of the instruction set.
    /// * `source` - Supplier of every thread's instructions.
    ///
    /// # Returns
    ///
    /// The core with every thread halted; call `startup` to activate the workload.
    pub fn new(
        config: &Config,
        isa: Box<dyn RegisterIsa>,
        source: Box<dyn InstSource>,
    ) -> SimResult<Self> {
        let cpu = &config.cpu;
        let requested = cpu.num_threads.max(cpu.workload_count);
        if requested > MAX_THREADS {
            return Err(SimError::TooManyThreads {
                requested,
                max: MAX_THREADS,
            });
        }
        if !cpu.switched_out && !cpu.has_interrupt_controller {
            return Err(SimError::MissingInterruptController);
        }

        let state = CoreState::new(config, isa.as_ref(), source)?;
        let num_threads = state.num_threads;
        let status = if cpu.switched_out {
            CpuStatus::SwitchedOut
        } else {
            CpuStatus::Running
        };

        info!(
            threads = num_threads,
            rob = cpu.rob_entries,
            width = cpu.commit_width,
            "o3 cpu created"
        );

        Ok(Self {
            state,
            fetch: Fetch::new(cpu.fetch_width),
            decode: Decode::new(cpu.decode_width),
            rename: Rename::new(cpu.rename_width),
            iew: Iew::new(cpu.dispatch_width, cpu.issue_width, cpu.iq_entries),
            commit: Commit::new(cpu.commit_width, config.general.trace),
            isa,
            events: EventQueue::new(),
            clock_period: config.general.clock_period.max(1),
            status,
            drain_state: DrainState::Running,
            thread_status: vec![ThreadStatus::Halted; num_threads],
            thread_regs: vec![0; num_threads],
            active_threads: Vec::with_capacity(num_threads),
            halting: [false; MAX_THREADS],
            suspending: [false; MAX_THREADS],
            to_activate: [false; MAX_THREADS],
            last_activated: [None; MAX_THREADS],
            last_running_cycle: 0,
            memory_mode: config.general.memory_mode,
            workload_threads: cpu.active_threads().min(num_threads),
        })
    }

    /// Activates the workload's thread contexts. A switched-out core waits for
    /// `take_over_from` instead.
    pub fn startup(&mut self) {
        if self.status == CpuStatus::SwitchedOut {
            return;
        }
        for tid in 0..self.workload_threads {
            self.activate_context(tid);
        }
    }

    /// Runs one event scheduled by this core.
    pub fn process_event(&mut self, event: CpuEvent) -> SimResult<()> {
        match event {
            CpuEvent::Tick => self.tick(),
            CpuEvent::ThreadExit => self.exit_threads(),
        }
    }

    /// Hardware thread contexts.
    #[inline]
    pub const fn num_threads(&self) -> usize {
        self.state.num_threads
    }

    /// Current cycle, derived from simulated time.
    #[inline]
    pub const fn cur_cycle(&self) -> u64 {
        self.events.cur_tick() / self.clock_period
    }

    /// Tick of the next clock edge.
    #[inline]
    pub const fn next_cycle(&self) -> u64 {
        (self.cur_cycle() + 1) * self.clock_period
    }

    /// Performance counters.
    #[inline]
    pub const fn stats(&self) -> &CpuStats {
        &self.state.stats
    }

    /// Instructions committed by every thread.
    pub fn total_insts(&self) -> u64 {
        self.state.stats.total_insts()
    }

    /// Operations committed by every thread.
    pub fn total_ops(&self) -> u64 {
        self.state.stats.total_ops()
    }

    /// Current memory system mode.
    #[inline]
    pub const fn memory_mode(&self) -> MemoryMode {
        self.memory_mode
    }

    /// Changes the memory system mode, as when switching to fast-forwarding.
    pub fn set_memory_mode(&mut self, mode: MemoryMode) {
        self.memory_mode = mode;
    }

    /// Fails unless the memory system is in timing mode.
    pub fn verify_memory_mode(&self) -> SimResult<()> {
        if self.memory_mode == MemoryMode::Timing {
            Ok(())
        } else {
            Err(SimError::MemoryModeNotTiming)
        }
    }
}
