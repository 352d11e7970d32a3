use o3sim_core::Simulator;
use o3sim_core::common::{RegId, SeqNum, ThreadId};
use o3sim_core::config::Config;
use o3sim_core::core::Cpu;
use o3sim_core::core::pipeline::dyn_inst::DynInst;
use o3sim_core::core::pipeline::stages::{Rename, RenameStatus};
use o3sim_core::core::pipeline::state::CoreState;
use o3sim_core::isa::GenericIsa;
use o3sim_core::sim::simulator::ExitReason;
use o3sim_core::sim::source::{ProgramSource, StaticInst};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config with 4 architectural and 10 physical integer registers and no zero register.
pub fn small_config() -> Config {
    let mut config = Config::default();
    config.isa.num_int_regs = 4;
    config.isa.int_zero_reg = None;
    config.cpu.num_phys_int_regs = 10;
    config
}

/// `reg = reg + 1`, `n` times.
pub fn increments(reg: u16, n: usize) -> Vec<StaticInst> {
    (0..n)
        .map(|_| StaticInst::alu(RegId::int(reg), &[RegId::int(reg)], 1))
        .collect()
}

pub struct TestContext {
    pub sim: Simulator,
}

impl TestContext {
    /// Builds a simulator running `programs`, one per thread.
    pub fn new(mut config: Config, programs: Vec<Vec<StaticInst>>) -> Self {
        init_tracing();
        config.cpu.workload_count = programs.len().max(1);
        let source = Box::new(ProgramSource::new(programs));
        let sim = Simulator::new(config, source).unwrap();
        Self { sim }
    }

    /// Convenience accessor for the CPU.
    pub fn cpu(&self) -> &Cpu {
        &self.sim.cpu
    }

    /// Mutable convenience accessor for the CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.sim.cpu
    }

    /// Runs until no event is left.
    pub fn run(&mut self) -> ExitReason {
        self.sim.run().unwrap()
    }

    /// Services events until the core has ticked `cycles` times or nothing is pending.
    pub fn run_cycles(&mut self, cycles: u64) {
        while self.cpu().stats().cycles < cycles {
            if !self.sim.step().unwrap() {
                break;
            }
        }
    }

    /// Committed value of integer register `index` of `tid`.
    pub fn int_reg(&self, tid: ThreadId, index: u16) -> u64 {
        self.cpu().read_arch_reg(tid, RegId::int(index)).unwrap()
    }
}

/// Register state alone, without stages, for driving rename, commit and squash by hand.
pub struct RenameContext {
    pub state: CoreState,
}

impl RenameContext {
    pub fn new(config: &Config) -> Self {
        init_tracing();
        let isa = GenericIsa::new(config.isa.clone());
        let state = CoreState::new(config, &isa, Box::new(ProgramSource::default())).unwrap();
        Self { state }
    }

    /// Inserts an instruction for `tid` and renames it.
    pub fn rename(&mut self, tid: ThreadId, inst: StaticInst) -> (SeqNum, RenameStatus) {
        let seq = self.state.next_seq();
        let pos = seq;
        let _ = self.state.inst_list.insert(DynInst::new(seq, tid, pos, inst));
        let status = Rename::rename_inst(&mut self.state, tid, seq).unwrap();
        (seq, status)
    }

    /// Renames `reg = reg + 1`.
    pub fn write(&mut self, tid: ThreadId, reg: u16) -> SeqNum {
        let (seq, status) =
            self.rename(tid, StaticInst::alu(RegId::int(reg), &[RegId::int(reg)], 1));
        assert_eq!(status, RenameStatus::Renamed);
        seq
    }

    /// Commits the oldest instruction of `tid`.
    pub fn commit_head(&mut self, tid: ThreadId) -> Option<SeqNum> {
        let head = self.state.rob.head(tid)?;
        self.state.commit_inst(tid, head).unwrap();
        Some(head)
    }

    pub fn lookup(&self, tid: ThreadId, reg: RegId) -> o3sim_core::common::PhysRegId {
        self.state.rename_maps[tid].lookup(reg).unwrap()
    }
}
