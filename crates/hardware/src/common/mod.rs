//! Common types shared by the core and the coherence subsystem.
//!
//! This module provides fundamental building blocks used across the simulator. It includes:
//! 1. **Constants:** Thread limits and sequence-number origin.
//! 2. **Error Handling:** Fatal `SimError`s and recoverable `Fault`s.
//! 3. **Register Identities:** Classes, architectural and physical register ids.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error and fault definitions.
pub mod error;

/// Register identities.
pub mod reg;

pub use constants::MAX_THREADS;
pub use error::{Fault, SimError, SimResult};
pub use reg::{PhysRegId, RegClass, RegId, SeqNum, ThreadId, VecMode};
