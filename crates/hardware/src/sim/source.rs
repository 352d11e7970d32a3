//! Instruction supply.
//!
//! The core does not model instruction memory; it pulls already-decoded
//! instructions from an `InstSource`. It provides:
//! 1. **Static Instructions:** `StaticInst`, an operation class with register operands.
//! 2. **Source Trait:** `InstSource`, a per-thread stream that can be rewound on squash.
//! 3. **Scripted Programs:** `ProgramSource`, fixed instruction lists loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::common::{Fault, RegId, ThreadId};

/// Operation class of a static instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OpClass {
    /// No operation.
    #[default]
    Nop,
    /// Integer arithmetic: result is the wrapping sum of sources plus the immediate.
    IntAlu,
    /// Conditional branch. Resolution may mispredict.
    Branch,
    /// Memory read through a data cache port. Yields the effective address.
    MemRead,
    /// Memory write through a data cache port.
    MemWrite,
    /// Writes the thread status register with the immediate at commit.
    ///
    /// The ISA may derive a different vector renaming mode from the new status.
    WriteStatus,
}

impl OpClass {
    /// Returns true for operations that occupy a data cache port.
    #[inline]
    pub const fn is_mem_ref(self) -> bool {
        matches!(self, Self::MemRead | Self::MemWrite)
    }
}

/// A decoded instruction as supplied by the front end.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaticInst {
    /// Operation class.
    #[serde(default)]
    pub op: OpClass,
    /// Destination registers, renamed in order.
    #[serde(default)]
    pub dests: Vec<RegId>,
    /// Source registers.
    #[serde(default)]
    pub srcs: Vec<RegId>,
    /// Immediate operand.
    #[serde(default)]
    pub imm: u64,
    /// For branches: resolves as mispredicted, squashing younger instructions.
    #[serde(default)]
    pub mispredicted: bool,
    /// Fault raised when the instruction executes.
    #[serde(default)]
    pub fault: Option<Fault>,
}

impl StaticInst {
    /// Integer ALU instruction `dest = srcs... + imm`.
    pub fn alu(dest: RegId, srcs: &[RegId], imm: u64) -> Self {
        Self {
            op: OpClass::IntAlu,
            dests: vec![dest],
            srcs: srcs.to_vec(),
            imm,
            ..Self::default()
        }
    }

    /// Branch reading `srcs`.
    pub fn branch(srcs: &[RegId], mispredicted: bool) -> Self {
        Self {
            op: OpClass::Branch,
            srcs: srcs.to_vec(),
            mispredicted,
            ..Self::default()
        }
    }

    /// Status register write.
    pub fn write_status(status: u64) -> Self {
        Self {
            op: OpClass::WriteStatus,
            imm: status,
            ..Self::default()
        }
    }

    /// Sets the fault raised at execute.
    #[must_use]
    pub const fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }
}

/// Per-thread supply of decoded instructions.
pub trait InstSource: std::fmt::Debug {
    /// Next instruction of `tid` and its stream position, or `None` once exhausted.
    fn next(&mut self, tid: ThreadId) -> Option<(u64, StaticInst)>;

    /// Restarts `tid` at stream position `pos`.
    fn rewind(&mut self, tid: ThreadId, pos: u64);

    /// Returns true if `tid` has nothing left to supply.
    fn is_exhausted(&self, tid: ThreadId) -> bool;

    /// Stream position of `tid`'s next instruction.
    fn position(&self, tid: ThreadId) -> u64;
}

/// Fixed per-thread instruction lists.
///
/// A single program assigned to several threads is shared: every thread walks
/// its own cursor over the same list.
#[derive(Debug, Clone, Default)]
pub struct ProgramSource {
    programs: Vec<Vec<StaticInst>>,
    cursors: Vec<u64>,
    shared: bool,
}

impl ProgramSource {
    /// One program per thread.
    pub fn new(programs: Vec<Vec<StaticInst>>) -> Self {
        let cursors = vec![0; programs.len()];
        Self {
            programs,
            cursors,
            shared: false,
        }
    }

    /// The same program on `num_threads` threads.
    pub fn shared(program: Vec<StaticInst>, num_threads: usize) -> Self {
        Self {
            programs: vec![program],
            cursors: vec![0; num_threads],
            shared: true,
        }
    }

    /// Parses a JSON array of programs (each an array of instructions).
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let programs: Vec<Vec<StaticInst>> = serde_json::from_str(text)?;
        Ok(Self::new(programs))
    }

    fn program(&self, tid: ThreadId) -> &[StaticInst] {
        let idx = if self.shared { 0 } else { tid };
        self.programs.get(idx).map_or(&[], Vec::as_slice)
    }
}

impl InstSource for ProgramSource {
    fn next(&mut self, tid: ThreadId) -> Option<(u64, StaticInst)> {
        let pos = *self.cursors.get(tid)?;
        let inst = self.program(tid).get(pos as usize)?.clone();
        self.cursors[tid] = pos + 1;
        Some((pos, inst))
    }

    fn rewind(&mut self, tid: ThreadId, pos: u64) {
        if let Some(cursor) = self.cursors.get_mut(tid) {
            *cursor = pos;
        }
    }

    fn is_exhausted(&self, tid: ThreadId) -> bool {
        self.cursors
            .get(tid)
            .is_none_or(|c| *c as usize >= self.program(tid).len())
    }

    fn position(&self, tid: ThreadId) -> u64 {
        self.cursors.get(tid).copied().unwrap_or_default()
    }
}
