//! Pipeline stage interface.
//!
//! Every stage is a concrete type owned by the CPU. Stages never hold references to
//! each other: each cycle they borrow the shared `CoreState`, read the previous
//! cycle's wires and write the current ones. It provides:
//! 1. **Tick:** One cycle of work for the threads currently active.
//! 2. **Drain Query:** Whether the stage holds any instruction.
//! 3. **Thread Reset:** Dropping one thread's buffered state.

use crate::common::{SimResult, ThreadId};
use crate::core::pipeline::state::CoreState;

/// A stage of the out-of-order pipeline.
pub trait PipelineStage {
    /// Executes one cycle of the stage.
    ///
    /// # Arguments
    ///
    /// * `state` - Structures shared with the other stages.
    /// * `active` - Active threads in priority order.
    fn tick(&mut self, state: &mut CoreState, active: &[ThreadId]) -> SimResult<()>;

    /// Returns true if the stage buffers no instruction.
    fn is_drained(&self) -> bool;

    /// Forgets everything the stage buffered for `tid`.
    fn clear_states(&mut self, tid: ThreadId);
}
