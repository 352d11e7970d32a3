//! Configuration system for the out-of-order core simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline core, register-file, ISA and coherence constants.
//! 2. **Structures:** Hierarchical config for general, cpu, isa, and ruby settings.
//! 3. **Validation:** `Config::validate` rejects impossible values and defaults unusable ones.
//!
//! Configuration is supplied as JSON (see the CLI `--config` flag) or via `Config::default()`.

use serde::Deserialize;
use tracing::warn;

use crate::common::constants::{MAX_THREADS, TICKS_PER_NS};
use crate::common::{RegClass, SimError, SimResult, VecMode};

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden in a JSON configuration file.
mod defaults {
    use super::TICKS_PER_NS;

    /// Clock period in ticks (2 GHz at 1 ps ticks).
    pub const CLOCK_PERIOD: u64 = TICKS_PER_NS / 2;

    /// Hardware threads per core.
    pub const NUM_THREADS: usize = 1;

    /// Number of workloads (programs) assigned to the core.
    pub const WORKLOAD_COUNT: usize = 1;

    /// Default width of every pipeline stage (instructions per cycle).
    pub const STAGE_WIDTH: usize = 8;

    /// Reorder buffer entries shared by all threads.
    pub const ROB_ENTRIES: usize = 192;

    /// Instruction queue entries shared by all threads.
    pub const IQ_ENTRIES: usize = 64;

    /// Depth of the backward time buffers (cycles of history).
    pub const BACK_COM_SIZE: usize = 5;

    /// Depth of the forward time buffers (cycles of future).
    pub const FORWARD_COM_SIZE: usize = 5;

    /// Instruction cache accesses per cycle.
    pub const NUM_ICACHE_PORTS: usize = 1;

    /// Data cache accesses per cycle.
    pub const NUM_DCACHE_PORTS: usize = 2;

    /// Physical integer registers.
    pub const PHYS_INT_REGS: usize = 256;

    /// Physical floating-point registers.
    pub const PHYS_FLOAT_REGS: usize = 256;

    /// Physical vector registers.
    pub const PHYS_VEC_REGS: usize = 64;

    /// Physical vector predicate registers.
    pub const PHYS_VEC_PRED_REGS: usize = 32;

    /// Physical condition-code registers.
    pub const PHYS_CC_REGS: usize = 16;

    /// Architectural integer registers.
    pub const ARCH_INT_REGS: usize = 32;

    /// Architectural floating-point registers.
    pub const ARCH_FLOAT_REGS: usize = 32;

    /// Architectural vector registers.
    pub const ARCH_VEC_REGS: usize = 32;

    /// Architectural vector predicate registers.
    pub const ARCH_VEC_PRED_REGS: usize = 16;

    /// Architectural condition-code registers.
    pub const ARCH_CC_REGS: usize = 4;

    /// Lanes per vector register.
    pub const ELEMS_PER_VEC: usize = 4;

    /// Integer zero register index.
    pub const INT_ZERO_REG: u16 = 0;

    /// Coherence block size in bytes.
    pub const BLOCK_SIZE_BYTES: u64 = 64;

    /// Physical memory size, log2 bytes.
    pub const MEMORY_SIZE_BITS: u32 = 32;
}

/// Memory system access mode.
///
/// The out-of-order core only runs against a memory system in timing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryMode {
    /// Cycle-accurate timing accesses.
    #[default]
    Timing,
    /// Atomic (zero-latency) accesses, used for fast-forwarding.
    Atomic,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use o3sim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cpu.num_threads, 1);
/// assert_eq!(config.ruby.block_size_bytes, 64);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use o3sim_core::config::{Config, MemoryMode};
/// use o3sim_core::common::VecMode;
///
/// let json = r#"{
///     "general": { "trace": true, "memory_mode": "Timing" },
///     "cpu": { "num_threads": 2, "workload_count": 2, "num_phys_int_regs": 128 },
///     "isa": { "num_int_regs": 16, "initial_vec_mode": "Elem" },
///     "ruby": { "block_size_bytes": 32 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert!(config.general.trace);
/// assert_eq!(config.general.memory_mode, MemoryMode::Timing);
/// assert_eq!(config.cpu.num_threads, 2);
/// assert_eq!(config.isa.initial_vec_mode, VecMode::Elem);
/// assert_eq!(config.ruby.block_size_bytes, 32);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Out-of-order core parameters
    #[serde(default)]
    pub cpu: CpuConfig,
    /// Architectural register layout
    #[serde(default)]
    pub isa: IsaConfig,
    /// Coherence subsystem parameters
    #[serde(default)]
    pub ruby: RubyConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> SimResult<Self> {
        serde_json::from_str(text).map_err(|e| SimError::InvalidConfig(e.to_string()))
    }

    /// Checks the configuration, defaulting values that are merely unusable.
    ///
    /// Zero stage widths, port counts and buffer depths are raised to one with a
    /// warning. Thread counts, register-file sizing and block size are fatal.
    pub fn validate(&mut self) -> SimResult<()> {
        let cpu = &mut self.cpu;
        for (name, value) in [
            ("fetch_width", &mut cpu.fetch_width),
            ("decode_width", &mut cpu.decode_width),
            ("rename_width", &mut cpu.rename_width),
            ("dispatch_width", &mut cpu.dispatch_width),
            ("issue_width", &mut cpu.issue_width),
            ("commit_width", &mut cpu.commit_width),
            ("rob_entries", &mut cpu.rob_entries),
            ("iq_entries", &mut cpu.iq_entries),
            ("num_icache_ports", &mut cpu.num_icache_ports),
            ("num_dcache_ports", &mut cpu.num_dcache_ports),
            ("back_com_size", &mut cpu.back_com_size),
            ("forward_com_size", &mut cpu.forward_com_size),
        ] {
            if *value == 0 {
                warn!(option = name, "unsupported value 0, defaulting to 1");
                *value = 1;
            }
        }

        if cpu.num_threads == 0 {
            return Err(SimError::InvalidConfig("num_threads must be at least 1".into()));
        }
        if cpu.num_threads > MAX_THREADS {
            return Err(SimError::TooManyThreads {
                requested: cpu.num_threads,
                max: MAX_THREADS,
            });
        }
        if cpu.workload_count > MAX_THREADS {
            return Err(SimError::TooManyThreads {
                requested: cpu.workload_count,
                max: MAX_THREADS,
            });
        }

        if self.isa.elems_per_vec == 0 {
            return Err(SimError::InvalidConfig("elems_per_vec must be at least 1".into()));
        }

        for class in RegClass::ALL {
            let have = self.cpu.phys_regs(class, self.isa.elems_per_vec);
            let need = self.cpu.num_threads * self.isa.arch_regs(class);
            if have < need {
                return Err(SimError::RegisterFileTooSmall { class, have, need });
            }
        }

        for (class, zero) in [
            (RegClass::Int, self.isa.int_zero_reg),
            (RegClass::Float, self.isa.float_zero_reg),
        ] {
            if let Some(z) = zero
                && z as usize >= self.isa.arch_regs(class)
            {
                return Err(SimError::InvalidConfig(format!(
                    "{class} zero register {z} out of range"
                )));
            }
        }

        if !self.ruby.block_size_bytes.is_power_of_two() {
            return Err(SimError::InvalidConfig(format!(
                "block_size_bytes {} is not a power of two",
                self.ruby.block_size_bytes
            )));
        }

        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Emit per-instruction debug events
    #[serde(default)]
    pub trace: bool,

    /// Memory system access mode
    #[serde(default)]
    pub memory_mode: MemoryMode,

    /// Ticks per core clock cycle
    #[serde(default = "GeneralConfig::default_clock_period")]
    pub clock_period: u64,
}

impl GeneralConfig {
    /// Returns the default clock period in ticks.
    fn default_clock_period() -> u64 {
        defaults::CLOCK_PERIOD
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            memory_mode: MemoryMode::default(),
            clock_period: defaults::CLOCK_PERIOD,
        }
    }
}

/// Out-of-order core parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CpuConfig {
    /// Hardware thread contexts
    #[serde(default = "CpuConfig::default_num_threads")]
    pub num_threads: usize,

    /// Programs assigned to the core; one program on several threads runs on all of them
    #[serde(default = "CpuConfig::default_workload_count")]
    pub workload_count: usize,

    /// Start switched out (another core owns the workload until takeover)
    #[serde(default)]
    pub switched_out: bool,

    /// Whether an interrupt controller is attached
    #[serde(default = "CpuConfig::default_true")]
    pub has_interrupt_controller: bool,

    /// Fetch width
    #[serde(default = "CpuConfig::default_width")]
    pub fetch_width: usize,

    /// Decode width
    #[serde(default = "CpuConfig::default_width")]
    pub decode_width: usize,

    /// Rename width
    #[serde(default = "CpuConfig::default_width")]
    pub rename_width: usize,

    /// Dispatch width (rename queue into ROB/IQ)
    #[serde(default = "CpuConfig::default_width")]
    pub dispatch_width: usize,

    /// Issue width
    #[serde(default = "CpuConfig::default_width")]
    pub issue_width: usize,

    /// Commit width
    #[serde(default = "CpuConfig::default_width")]
    pub commit_width: usize,

    /// Reorder buffer entries
    #[serde(default = "CpuConfig::default_rob_entries")]
    pub rob_entries: usize,

    /// Instruction queue entries
    #[serde(default = "CpuConfig::default_iq_entries")]
    pub iq_entries: usize,

    /// Backward time buffer depth
    #[serde(default = "CpuConfig::default_back_com_size")]
    pub back_com_size: usize,

    /// Forward time buffer depth
    #[serde(default = "CpuConfig::default_forward_com_size")]
    pub forward_com_size: usize,

    /// Instruction cache ports
    #[serde(default = "CpuConfig::default_icache_ports")]
    pub num_icache_ports: usize,

    /// Data cache ports
    #[serde(default = "CpuConfig::default_dcache_ports")]
    pub num_dcache_ports: usize,

    /// Physical integer registers
    #[serde(default = "CpuConfig::default_phys_int")]
    pub num_phys_int_regs: usize,

    /// Physical floating-point registers
    #[serde(default = "CpuConfig::default_phys_float")]
    pub num_phys_float_regs: usize,

    /// Physical vector registers (vector elements alias their lanes)
    #[serde(default = "CpuConfig::default_phys_vec")]
    pub num_phys_vec_regs: usize,

    /// Physical vector predicate registers
    #[serde(default = "CpuConfig::default_phys_vec_pred")]
    pub num_phys_vec_pred_regs: usize,

    /// Physical condition-code registers
    #[serde(default = "CpuConfig::default_phys_cc")]
    pub num_phys_cc_regs: usize,
}

impl CpuConfig {
    fn default_num_threads() -> usize {
        defaults::NUM_THREADS
    }

    fn default_workload_count() -> usize {
        defaults::WORKLOAD_COUNT
    }

    fn default_true() -> bool {
        true
    }

    fn default_width() -> usize {
        defaults::STAGE_WIDTH
    }

    fn default_rob_entries() -> usize {
        defaults::ROB_ENTRIES
    }

    fn default_iq_entries() -> usize {
        defaults::IQ_ENTRIES
    }

    fn default_back_com_size() -> usize {
        defaults::BACK_COM_SIZE
    }

    fn default_forward_com_size() -> usize {
        defaults::FORWARD_COM_SIZE
    }

    fn default_icache_ports() -> usize {
        defaults::NUM_ICACHE_PORTS
    }

    fn default_dcache_ports() -> usize {
        defaults::NUM_DCACHE_PORTS
    }

    fn default_phys_int() -> usize {
        defaults::PHYS_INT_REGS
    }

    fn default_phys_float() -> usize {
        defaults::PHYS_FLOAT_REGS
    }

    fn default_phys_vec() -> usize {
        defaults::PHYS_VEC_REGS
    }

    fn default_phys_vec_pred() -> usize {
        defaults::PHYS_VEC_PRED_REGS
    }

    fn default_phys_cc() -> usize {
        defaults::PHYS_CC_REGS
    }

    /// Physical registers backing `class`. Vector elements alias vector lanes.
    pub const fn phys_regs(&self, class: RegClass, elems_per_vec: usize) -> usize {
        match class {
            RegClass::Int => self.num_phys_int_regs,
            RegClass::Float => self.num_phys_float_regs,
            RegClass::Vec => self.num_phys_vec_regs,
            RegClass::VecElem => self.num_phys_vec_regs * elems_per_vec,
            RegClass::VecPred => self.num_phys_vec_pred_regs,
            RegClass::CondCode => self.num_phys_cc_regs,
        }
    }

    /// Threads that start with a workload.
    ///
    /// One program shared by several threads runs on all of them; otherwise each
    /// program gets one thread.
    pub const fn active_threads(&self) -> usize {
        if self.num_threads > 1 && self.workload_count == 1 {
            self.num_threads
        } else {
            self.workload_count
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            num_threads: defaults::NUM_THREADS,
            workload_count: defaults::WORKLOAD_COUNT,
            switched_out: false,
            has_interrupt_controller: true,
            fetch_width: defaults::STAGE_WIDTH,
            decode_width: defaults::STAGE_WIDTH,
            rename_width: defaults::STAGE_WIDTH,
            dispatch_width: defaults::STAGE_WIDTH,
            issue_width: defaults::STAGE_WIDTH,
            commit_width: defaults::STAGE_WIDTH,
            rob_entries: defaults::ROB_ENTRIES,
            iq_entries: defaults::IQ_ENTRIES,
            back_com_size: defaults::BACK_COM_SIZE,
            forward_com_size: defaults::FORWARD_COM_SIZE,
            num_icache_ports: defaults::NUM_ICACHE_PORTS,
            num_dcache_ports: defaults::NUM_DCACHE_PORTS,
            num_phys_int_regs: defaults::PHYS_INT_REGS,
            num_phys_float_regs: defaults::PHYS_FLOAT_REGS,
            num_phys_vec_regs: defaults::PHYS_VEC_REGS,
            num_phys_vec_pred_regs: defaults::PHYS_VEC_PRED_REGS,
            num_phys_cc_regs: defaults::PHYS_CC_REGS,
        }
    }
}

/// Architectural register layout.
#[derive(Debug, Clone, Deserialize)]
pub struct IsaConfig {
    /// Architectural integer registers
    #[serde(default = "IsaConfig::default_int")]
    pub num_int_regs: usize,

    /// Architectural floating-point registers
    #[serde(default = "IsaConfig::default_float")]
    pub num_float_regs: usize,

    /// Architectural vector registers
    #[serde(default = "IsaConfig::default_vec")]
    pub num_vec_regs: usize,

    /// Architectural vector predicate registers
    #[serde(default = "IsaConfig::default_vec_pred")]
    pub num_vec_pred_regs: usize,

    /// Architectural condition-code registers
    #[serde(default = "IsaConfig::default_cc")]
    pub num_cc_regs: usize,

    /// Lanes per vector register
    #[serde(default = "IsaConfig::default_elems")]
    pub elems_per_vec: usize,

    /// Integer register hardwired to zero, if any
    #[serde(default = "IsaConfig::default_int_zero")]
    pub int_zero_reg: Option<u16>,

    /// Floating-point register hardwired to zero, if any
    #[serde(default)]
    pub float_zero_reg: Option<u16>,

    /// Vector renaming mode at reset
    #[serde(default)]
    pub initial_vec_mode: VecMode,
}

impl IsaConfig {
    fn default_int() -> usize {
        defaults::ARCH_INT_REGS
    }

    fn default_float() -> usize {
        defaults::ARCH_FLOAT_REGS
    }

    fn default_vec() -> usize {
        defaults::ARCH_VEC_REGS
    }

    fn default_vec_pred() -> usize {
        defaults::ARCH_VEC_PRED_REGS
    }

    fn default_cc() -> usize {
        defaults::ARCH_CC_REGS
    }

    fn default_elems() -> usize {
        defaults::ELEMS_PER_VEC
    }

    fn default_int_zero() -> Option<u16> {
        Some(defaults::INT_ZERO_REG)
    }

    /// Architectural registers in `class`.
    pub const fn arch_regs(&self, class: RegClass) -> usize {
        match class {
            RegClass::Int => self.num_int_regs,
            RegClass::Float => self.num_float_regs,
            RegClass::Vec => self.num_vec_regs,
            RegClass::VecElem => self.num_vec_regs * self.elems_per_vec,
            RegClass::VecPred => self.num_vec_pred_regs,
            RegClass::CondCode => self.num_cc_regs,
        }
    }
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self {
            num_int_regs: defaults::ARCH_INT_REGS,
            num_float_regs: defaults::ARCH_FLOAT_REGS,
            num_vec_regs: defaults::ARCH_VEC_REGS,
            num_vec_pred_regs: defaults::ARCH_VEC_PRED_REGS,
            num_cc_regs: defaults::ARCH_CC_REGS,
            elems_per_vec: defaults::ELEMS_PER_VEC,
            int_zero_reg: Some(defaults::INT_ZERO_REG),
            float_zero_reg: None,
            initial_vec_mode: VecMode::default(),
        }
    }
}

/// Coherence subsystem parameters.
///
/// Built once and shared by reference with every coherence component.
#[derive(Debug, Clone, Deserialize)]
pub struct RubyConfig {
    /// Coherence block size in bytes (power of two)
    #[serde(default = "RubyConfig::default_block_size")]
    pub block_size_bytes: u64,

    /// Physical memory size, log2 bytes
    #[serde(default = "RubyConfig::default_memory_size_bits")]
    pub memory_size_bits: u32,

    /// Randomize message latencies in the network
    #[serde(default)]
    pub randomization: bool,

    /// Service functional accesses from the backing store
    #[serde(default)]
    pub access_backing_store: bool,
}

impl RubyConfig {
    fn default_block_size() -> u64 {
        defaults::BLOCK_SIZE_BYTES
    }

    fn default_memory_size_bits() -> u32 {
        defaults::MEMORY_SIZE_BITS
    }

    /// log2 of the block size.
    pub const fn block_size_bits(&self) -> u32 {
        self.block_size_bytes.trailing_zeros()
    }

    /// Clears the offset bits of `addr`.
    #[inline]
    pub const fn line_address(&self, addr: u64) -> u64 {
        addr & !(self.block_size_bytes - 1)
    }
}

impl Default for RubyConfig {
    fn default() -> Self {
        Self {
            block_size_bytes: defaults::BLOCK_SIZE_BYTES,
            memory_size_bits: defaults::MEMORY_SIZE_BITS,
            randomization: false,
            access_backing_store: false,
        }
    }
}
