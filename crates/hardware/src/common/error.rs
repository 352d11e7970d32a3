//! Simulator errors and instruction faults.
//!
//! This module defines the two kinds of abnormal outcome the core can produce. It provides:
//! 1. **Fatal Errors:** `SimError`, modeling bugs or impossible configurations that end the run.
//! 2. **Faults:** `Fault`, recoverable conditions resolved through the squash path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::reg::{PhysRegId, RegClass, RegId, ThreadId};

/// Fatal simulator error.
///
/// Every variant identifies the offending thread, controller, or resource. None of these
/// are retried: the driver stops the run on the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A register class ran out of free physical registers.
    #[error("free list exhausted for {class} registers")]
    FreeListExhausted {
        /// The exhausted class.
        class: RegClass,
    },

    /// A physical register was released while already free.
    #[error("double free of physical register {reg}")]
    DoubleFree {
        /// The register released twice.
        reg: PhysRegId,
    },

    /// The configured physical register count cannot back every thread's architectural state.
    #[error("{class} register file too small: {have} physical, need at least {need}")]
    RegisterFileTooSmall {
        /// The undersized class.
        class: RegClass,
        /// Configured physical registers.
        have: usize,
        /// `num_threads * architectural registers`.
        need: usize,
    },

    /// The workload asks for more threads than the core supports.
    #[error("workload size {requested} exceeds the maximum of {max} threads")]
    TooManyThreads {
        /// Requested thread count.
        requested: usize,
        /// Supported maximum.
        max: usize,
    },

    /// The core was built without an interrupt controller.
    #[error("cpu has no interrupt controller")]
    MissingInterruptController,

    /// The memory system is not in timing mode.
    #[error("the out-of-order core requires the memory system to be in timing mode")]
    MemoryModeNotTiming,

    /// More than one coherence controller holds write permission for a line.
    #[error("coherence violation at line {line:#x}: controllers {controllers:?} all report ReadWrite")]
    CoherenceViolation {
        /// Line address.
        line: u64,
        /// Indices of the controllers reporting ReadWrite.
        controllers: Vec<usize>,
    },

    /// A vector register was addressed through the interface the current mode disables.
    #[error("{reg} is not addressable in the current vector mode")]
    InactiveVecMode {
        /// The register looked up.
        reg: RegId,
    },

    /// Free and mapped registers of a class no longer add up to the class size.
    #[error("{class} register leak: {free} free + {mapped} mapped != {total}")]
    RegisterLeak {
        /// Class that failed the conservation check.
        class: RegClass,
        /// Registers on the free list.
        free: usize,
        /// Registers referenced by a map or an in-flight instruction.
        mapped: usize,
        /// Class size.
        total: usize,
    },

    /// The vector mode was switched while the thread still had instructions in flight.
    #[error("thread {tid} has instructions in flight; cannot switch vector mode")]
    ModeSwitchInFlight {
        /// Thread that requested the switch.
        tid: ThreadId,
    },

    /// The core stopped ticking while a running thread still had instructions in flight.
    #[error("thread {tid} stalled with {in_flight} instructions in flight")]
    PipelineStalled {
        /// Thread left with work.
        tid: ThreadId,
        /// Its in-flight instruction count.
        in_flight: usize,
    },

    /// A sequence number the ROB refers to is not in the instruction list.
    #[error("instruction [sn:{seq}] not found in the instruction list")]
    InstNotFound {
        /// Missing sequence number.
        seq: u64,
    },

    /// No directory controller owns a line written back from a cache trace.
    #[error("no directory controller for line {line:#x} (node {node})")]
    NoDirectory {
        /// Line address.
        line: u64,
        /// Node the network maps the line to.
        node: usize,
    },

    /// A cache trace record cannot be written back.
    #[error("invalid cache trace record for line {line:#x}")]
    InvalidTraceRecord {
        /// Line address of the record.
        line: u64,
    },

    /// A cache trace was requested before any was recorded.
    #[error("no cache trace recorded; run a memory writeback first")]
    NoCacheTrace,

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Recoverable instruction fault.
///
/// Faults ride with the instruction to the ROB head, where commit squashes the
/// faulting instruction and everything younger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// Undefined instruction encoding.
    IllegalInstruction,
    /// Memory access that could not be completed.
    AccessFault(u64),
    /// Explicit trap request.
    Trap(u64),
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalInstruction => write!(f, "IllegalInstruction"),
            Self::AccessFault(addr) => write!(f, "AccessFault({addr:#x})"),
            Self::Trap(code) => write!(f, "Trap({code})"),
        }
    }
}

/// Shorthand for results carrying a `SimError`.
pub type SimResult<T> = Result<T, SimError>;
