//! # Simulation Driver Tests

/// Event ordering, descheduling and time warps.
pub mod event;
