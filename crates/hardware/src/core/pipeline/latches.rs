//! Payloads carried by the inter-stage time buffers.
//!
//! Forward buffers carry sequence numbers; the instructions themselves stay in
//! the instruction list. It provides:
//! 1. **Forward Flow:** Fetch → Decode → Rename → IEW → Commit payloads.
//! 2. **Backward Flow:** Squash and progress signals from commit, and per-stage
//!    backpressure, per thread.

use crate::common::{MAX_THREADS, SeqNum};

/// Fetch to Decode.
#[derive(Clone, Debug, Default)]
pub struct FetchStruct {
    /// Fetched instructions in program order.
    pub insts: Vec<SeqNum>,
}

/// Decode to Rename.
#[derive(Clone, Debug, Default)]
pub struct DecodeStruct {
    /// Decoded instructions in program order.
    pub insts: Vec<SeqNum>,
}

/// Rename to IEW.
#[derive(Clone, Debug, Default)]
pub struct RenameStruct {
    /// Renamed instructions, already in the ROB.
    pub insts: Vec<SeqNum>,
}

/// IEW to Commit.
#[derive(Clone, Debug, Default)]
pub struct IewStruct {
    /// Instructions written back this cycle.
    pub executed: Vec<SeqNum>,
    /// Branches that resolved as mispredicted this cycle.
    pub mispredicts: Vec<SeqNum>,
}

/// A squash broadcast for one thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquashComm {
    /// Everything younger than this was discarded.
    pub seq: SeqNum,
    /// Stream position fetch resumes from.
    pub rewind_pos: u64,
}

/// Per-thread commit feedback.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommitComm {
    /// Squash to apply in the front end.
    pub squash: Option<SquashComm>,
    /// Youngest instruction committed this cycle.
    pub done_seq: Option<SeqNum>,
}

/// Backward payload, Commit to the earlier stages.
#[derive(Clone, Debug, Default)]
pub struct TimeStruct {
    /// Feedback per thread.
    pub commit: [CommitComm; MAX_THREADS],
    /// Decode has a backlog; fetch should stall.
    pub decode_block: [bool; MAX_THREADS],
    /// Rename has a backlog; decode should stall.
    pub rename_block: [bool; MAX_THREADS],
    /// Dispatch has a backlog; rename should stall.
    pub iew_block: [bool; MAX_THREADS],
}
