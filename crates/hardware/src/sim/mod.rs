//! Simulation driver and the core's external collaborators.
//!
//! Provides the discrete-event queue the core schedules itself on, the
//! instruction supply interface, and the top-level simulator loop.

/// Discrete-event scheduling.
pub mod event;

/// Top-level simulator loop.
pub mod simulator;

/// Instruction supply.
pub mod source;

pub use simulator::Simulator;
