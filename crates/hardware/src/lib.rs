//! Out-of-order core and coherence-arbiter simulator library.
//!
//! This crate models the parts of a superscalar core that keep speculative state
//! consistent, together with the functional side of a directory coherence system:
//! 1. **Core:** Fetch, decode, rename, issue/execute/writeback and commit stages over
//!    shared physical register files, rename maps, scoreboard and reorder buffer.
//! 2. **Squash and Drain:** Rollback on mispredictions and faults, and the protocol
//!    that quiesces the pipeline before a checkpoint or a CPU switch.
//! 3. **Threads:** Activation, suspension, halting and takeover of hardware contexts.
//! 4. **Ruby:** Functional read/write arbitration across coherence controllers, and
//!    cache trace writeback and warmup for checkpoints.
//! 5. **Simulation:** Event queue, instruction sources, configuration and statistics.

/// Common types and constants (register ids, errors, faults).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures, validation).
pub mod config;
/// CPU core (pipeline structures, stages, thread and drain control).
pub mod core;
/// ISA hooks (zero registers, vector renaming mode).
pub mod isa;
/// Coherence subsystem (functional access arbiter, cache traces).
pub mod ruby;
/// Event queue, instruction sources and the simulation driver.
pub mod sim;
/// Simulation statistics collection.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Out-of-order CPU; holds the pipeline, register state and thread contexts.
pub use crate::core::Cpu;
/// Functional access arbiter over coherence controllers.
pub use crate::ruby::RubySystem;
/// Event-driven driver that runs a CPU to completion.
pub use crate::sim::Simulator;
