//! Out-of-order instruction pipeline.
//!
//! This module contains the structures of the five-stage out-of-order pipeline.
//! It includes the following components:
//! 1. **Register State:** Physical register file, free list, rename maps and scoreboard.
//! 2. **Instruction Tracking:** The in-flight instruction list and the reorder buffer.
//! 3. **Communication:** Time buffers and their per-stage payloads, cache ports,
//!    activity tracking.
//! 4. **Stages:** Fetch, Decode, Rename, IEW and Commit.
//! 5. **Shared State:** `CoreState`, which the stages borrow in turn every cycle.

/// Activity window used to decide whether to keep ticking.
pub mod activity;

/// Dynamic (in-flight) instructions and rename undo records.
pub mod dyn_inst;

/// Physical register free list.
pub mod free_list;

/// Arena of in-flight instructions with deferred removal.
pub mod inst_list;

/// Payloads carried by the inter-stage time buffers.
pub mod latches;

/// Instruction and data cache ports.
pub mod port;

/// Physical register file.
pub mod regfile;

/// Architectural to physical register maps.
pub mod rename_map;

/// Reorder buffer.
pub mod rob;

/// Physical register readiness.
pub mod scoreboard;

/// Pipeline stage implementations.
pub mod stages;

/// State shared by every stage.
pub mod state;

/// Cycle-indexed inter-stage buffers.
pub mod time_buffer;

/// Traits for pipeline stages.
pub mod traits;
