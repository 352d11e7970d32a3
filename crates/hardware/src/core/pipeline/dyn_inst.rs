//! In-flight (dynamic) instruction.
//!
//! A `DynInst` is one fetched instance of a static instruction. It carries the
//! renamed operands and the undo records that commit and squash consume.

use crate::common::{Fault, PhysRegId, RegId, SeqNum, ThreadId};
use crate::sim::source::StaticInst;

/// Undo record for one renamed destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenameRecord {
    /// Architectural destination.
    pub arch: RegId,
    /// Mapping before this instruction. Freed at commit, restored at squash.
    pub old: PhysRegId,
    /// Mapping installed by this instruction. Freed at squash.
    pub new: PhysRegId,
}

/// Lifecycle of an in-flight instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InstStatus {
    /// Fetched and not yet retired or discarded.
    #[default]
    InFlight,
    /// Retired; its old mappings have been freed.
    Committed,
    /// Discarded; its renames have been undone.
    Squashed,
}

/// A dynamic instruction.
#[derive(Clone, Debug)]
pub struct DynInst {
    /// Global sequence number.
    pub seq: SeqNum,
    /// Owning thread.
    pub tid: ThreadId,
    /// Position in the thread's instruction stream, used to refetch after a squash.
    pub pos: u64,
    /// Decoded instruction.
    pub inst: StaticInst,
    /// Renamed sources, in operand order.
    pub srcs: Vec<PhysRegId>,
    /// Renamed destinations, in operand order.
    pub records: Vec<RenameRecord>,
    /// Lifecycle state.
    pub status: InstStatus,
    /// Renamed and inserted into the ROB.
    pub renamed: bool,
    /// Selected for execution.
    pub issued: bool,
    /// Result written back.
    pub executed: bool,
    /// Commit has seen the writeback notification.
    pub can_commit: bool,
    /// Fault raised at execute.
    pub fault: Option<Fault>,
    /// Computed result.
    pub result: u64,
}

impl DynInst {
    /// Wraps a freshly fetched instruction.
    pub const fn new(seq: SeqNum, tid: ThreadId, pos: u64, inst: StaticInst) -> Self {
        Self {
            seq,
            tid,
            pos,
            inst,
            srcs: Vec::new(),
            records: Vec::new(),
            status: InstStatus::InFlight,
            renamed: false,
            issued: false,
            executed: false,
            can_commit: false,
            fault: None,
            result: 0,
        }
    }

    /// Returns true once the instruction has been squashed.
    #[inline]
    pub fn is_squashed(&self) -> bool {
        self.status == InstStatus::Squashed
    }

    /// Returns true while neither committed nor squashed.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.status == InstStatus::InFlight
    }
}
