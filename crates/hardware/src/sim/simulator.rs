//! Simulator: owns the CPU and services its events.
//!
//! The core schedules its own ticks, so running a simulation is a matter of
//! servicing events until none is left. A cycle limit guards against workloads
//! that never finish.

use tracing::{info, warn};

use crate::common::{SimError, SimResult};
use crate::config::Config;
use crate::core::{Cpu, ThreadStatus};
use crate::isa::GenericIsa;
use crate::sim::source::InstSource;
use crate::stats::CpuStats;

/// Default upper bound on simulated cycles.
pub const DEFAULT_MAX_CYCLES: u64 = 1_000_000;

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// No event is left: every thread halted or the core idled.
    Finished,
    /// The cycle limit was reached.
    CycleLimit,
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    /// The simulated core.
    pub cpu: Cpu,
    max_cycles: u64,
}

impl Simulator {
    /// Validates `config`, builds the core and activates the workload.
    pub fn new(mut config: Config, source: Box<dyn InstSource>) -> SimResult<Self> {
        config.validate()?;
        let isa = Box::new(GenericIsa::new(config.isa.clone()));
        let mut cpu = Cpu::new(&config, isa, source)?;
        cpu.startup();
        Ok(Self {
            cpu,
            max_cycles: DEFAULT_MAX_CYCLES,
        })
    }

    /// Sets the cycle limit.
    #[must_use]
    pub const fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Services one event.
    ///
    /// # Returns
    ///
    /// `false` once no event is pending.
    pub fn step(&mut self) -> SimResult<bool> {
        match self.cpu.events.service_one() {
            Some((_, event)) => {
                self.cpu.process_event(event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs until no event is pending or the cycle limit is hit.
    ///
    /// Stops at the first fatal error. Running out of events while an active
    /// thread still holds instructions is an error, not a finish.
    pub fn run(&mut self) -> SimResult<ExitReason> {
        while self.step()? {
            if self.cpu.stats().cycles >= self.max_cycles {
                warn!(cycles = self.max_cycles, "cycle limit reached");
                return Ok(ExitReason::CycleLimit);
            }
        }
        for tid in 0..self.cpu.num_threads() {
            let in_flight = self.cpu.state.inst_list.count_in_flight(tid);
            if self.cpu.thread_status[tid] == ThreadStatus::Active && in_flight > 0 {
                return Err(SimError::PipelineStalled { tid, in_flight });
            }
        }
        info!(
            cycles = self.cpu.stats().cycles,
            insts = self.cpu.total_insts(),
            "simulation finished"
        );
        Ok(ExitReason::Finished)
    }

    /// Performance counters of the core.
    pub const fn stats(&self) -> &CpuStats {
        self.cpu.stats()
    }
}
