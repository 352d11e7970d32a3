//! Coherence subsystem functional access.
//!
//! The timing side of the coherence protocol is out of scope; this module models
//! what checkpointing and debug inspection need from it. It provides:
//! 1. **Permissions:** `AccessPermission`, each controller's view of a line.
//! 2. **Components:** `CoherenceController` and `Network`, the traits the arbiter talks to.
//! 3. **Arbiter:** `RubySystem`, functional reads and writes across every copy of a line.
//! 4. **Checkpointing:** Cache trace recording, writeback and warmup replay.

/// Coherence controllers.
pub mod controller;

/// Interconnect network.
pub mod network;

/// Functional access packets.
pub mod packet;

/// Cache trace recording.
pub mod recorder;

/// Functional read/write arbiter and checkpoint support.
pub mod system;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use controller::{CoherenceController, SimpleController};
pub use network::{Network, SimpleNetwork};
pub use packet::{Packet, PacketCmd};
pub use recorder::{CacheRecorder, CacheTrace, RequestType, TraceRecord, WriteMask};
pub use system::RubySystem;

/// A controller's permission on one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessPermission {
    /// Readable, possibly shared.
    ReadOnly,
    /// Exclusively owned; at most one controller may hold it.
    ReadWrite,
    /// In a transient state.
    Busy,
    /// Memory of a broadcast protocol, which cannot tell whether caches hold copies.
    BackingStore,
    /// Not readable.
    Invalid,
    /// Not tracked by this controller.
    NotPresent,
}

impl AccessPermission {
    /// Returns true for permissions that do not hold the line.
    #[inline]
    pub const fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid | Self::NotPresent)
    }
}

/// Kind of coherence controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MachineType {
    /// Private first-level cache.
    L1Cache,
    /// Shared second-level cache.
    L2Cache,
    /// Directory fronting memory.
    Directory,
    /// DMA engine.
    Dma,
}

/// Identity of a controller: its kind and its index among controllers of that kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MachineId {
    /// Controller kind.
    pub kind: MachineType,
    /// Index within the kind.
    pub num: usize,
}

impl MachineId {
    /// Creates a machine id.
    pub const fn new(kind: MachineType, num: usize) -> Self {
        Self { kind, num }
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}_{}", self.kind, self.num)
    }
}
