//! Pipeline stage implementations.
//!
//! This module contains the five stages of the out-of-order pipeline. It includes:
//! 1. **Fetch:** Pulls instructions from the instruction source into the instruction list.
//! 2. **Decode:** Buffers fetched instructions and applies decode bandwidth.
//! 3. **Rename:** Maps architectural registers to physical ones and allocates ROB entries.
//! 4. **IEW:** Dispatches, issues and executes instructions; resolves branches.
//! 5. **Commit:** Retires instructions in order and performs every squash.

/// Instruction commit stage implementation.
pub mod commit;

/// Instruction decode stage implementation.
pub mod decode;

/// Instruction fetch stage implementation.
pub mod fetch;

/// Issue/execute/writeback stage implementation.
pub mod iew;

/// Register rename stage implementation.
pub mod rename;

pub use commit::{Commit, CommitOutcome};
pub use decode::Decode;
pub use fetch::Fetch;
pub use iew::Iew;
pub use rename::{Rename, RenameStatus};
