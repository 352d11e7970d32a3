//! Core processor implementation.
//!
//! This module contains the out-of-order CPU: the pipeline structures and
//! stages, and the controller that ticks them and manages thread contexts.

/// CPU core implementation and execution orchestration.
pub mod cpu;

/// Out-of-order pipeline (register state, instruction tracking, stages).
pub mod pipeline;

pub use self::cpu::{Cpu, CpuStatus, DrainState, ThreadStatus};
