//! Coherence controllers.
//!
//! This module defines the interface between the arbiter and a controller. It provides:
//! 1. **Trait:** `CoherenceController`, permission queries and functional access.
//! 2. **Table Controller:** `SimpleController`, a controller whose lines, buffers and
//!    memory are plain tables, used to drive the arbiter outside a full protocol.

use std::collections::BTreeMap;

use super::packet::Packet;
use super::recorder::{CacheRecorder, RequestType, TraceRecord, WriteMask};
use super::{AccessPermission, MachineId, MachineType};

/// A coherence controller attached to the arbiter.
///
/// Line addresses passed in are already aligned to the block size.
pub trait CoherenceController {
    /// Identity of the controller.
    fn machine_id(&self) -> MachineId;

    /// Permission the controller holds on `line`.
    fn access_permission(&self, line: u64) -> AccessPermission;

    /// Reads the controller's stable copy of `line` into `pkt`.
    ///
    /// # Returns
    ///
    /// True if the controller held data for the line.
    fn functional_read(&self, line: u64, pkt: &mut Packet) -> bool;

    /// Reads `pkt` from messages queued inside the controller.
    fn functional_read_buffers(&self, pkt: &mut Packet) -> bool;

    /// Writes `pkt` into the stable copy of `line`. Returns the number of copies written.
    fn functional_write(&mut self, line: u64, pkt: &Packet) -> u32;

    /// Writes `pkt` into messages queued inside the controller. Returns the number written.
    fn functional_write_buffers(&mut self, pkt: &Packet) -> u32;

    /// Writes `pkt` straight to the memory behind the controller.
    fn functional_memory_write(&mut self, pkt: &Packet);

    /// Adds a record for every line the controller holds.
    ///
    /// # Arguments
    ///
    /// * `idx` - Index of this controller in the arbiter, stored in each record.
    /// * `recorder` - Recorder the records are appended to.
    fn record_cache_trace(&self, idx: usize, recorder: &mut CacheRecorder);

    /// Installs the line described by `record`, recreating its checkpointed state.
    fn warmup(&mut self, record: &TraceRecord);
}

#[derive(Clone, Debug)]
struct Line {
    perm: AccessPermission,
    data: Vec<u8>,
}

/// Table-driven controller.
///
/// Lines carry an explicit permission and their data. Queued messages are kept as
/// (line, data) pairs. A controller built with a backing store reports
/// `BackingStore` for every line it does not cache and serves it from memory.
#[derive(Clone, Debug)]
pub struct SimpleController {
    id: MachineId,
    block_size: usize,
    lines: BTreeMap<u64, Line>,
    buffers: Vec<(u64, Vec<u8>)>,
    memory: BTreeMap<u64, Vec<u8>>,
    backing_store: bool,
}

impl SimpleController {
    /// Creates a controller with no lines.
    pub fn new(id: MachineId, block_size_bytes: u64) -> Self {
        Self {
            id,
            block_size: block_size_bytes as usize,
            lines: BTreeMap::new(),
            buffers: Vec::new(),
            memory: BTreeMap::new(),
            backing_store: false,
        }
    }

    /// Creates a directory controller that owns memory.
    pub fn directory(num: usize, block_size_bytes: u64) -> Self {
        Self::new(MachineId::new(MachineType::Directory, num), block_size_bytes)
    }

    /// Makes uncached lines report `BackingStore`.
    #[must_use]
    pub const fn with_backing_store(mut self) -> Self {
        self.backing_store = true;
        self
    }

    /// Sets the permission and data of `line`.
    pub fn set_line(&mut self, line: u64, perm: AccessPermission, data: Vec<u8>) {
        let _ = self.lines.insert(line, Line { perm, data });
    }

    /// Queues a message carrying `data` for `line`.
    pub fn push_buffer(&mut self, line: u64, data: Vec<u8>) {
        self.buffers.push((line, data));
    }

    /// Data of `line` held in memory.
    pub fn memory_block(&self, line: u64) -> Vec<u8> {
        self.memory
            .get(&line)
            .cloned()
            .unwrap_or_else(|| vec![0; self.block_size])
    }

    /// Data of `line` held in the controller's stable state.
    pub fn line_data(&self, line: u64) -> Option<&[u8]> {
        self.lines.get(&line).map(|l| l.data.as_slice())
    }

    fn line_of(&self, addr: u64) -> u64 {
        addr & !(self.block_size as u64 - 1)
    }
}

impl CoherenceController for SimpleController {
    fn machine_id(&self) -> MachineId {
        self.id
    }

    fn access_permission(&self, line: u64) -> AccessPermission {
        match self.lines.get(&line) {
            Some(l) => l.perm,
            None if self.backing_store => AccessPermission::BackingStore,
            None => AccessPermission::NotPresent,
        }
    }

    fn functional_read(&self, line: u64, pkt: &mut Packet) -> bool {
        if let Some(l) = self.lines.get(&line) {
            return pkt.read_from_block(line, &l.data);
        }
        if self.backing_store {
            return pkt.read_from_block(line, &self.memory_block(line));
        }
        false
    }

    fn functional_read_buffers(&self, pkt: &mut Packet) -> bool {
        let line = self.line_of(pkt.addr);
        self.buffers
            .iter()
            .find(|(addr, _)| *addr == line)
            .is_some_and(|(addr, data)| pkt.read_from_block(*addr, data))
    }

    fn functional_write(&mut self, line: u64, pkt: &Packet) -> u32 {
        match self.lines.get_mut(&line) {
            Some(l) => u32::from(pkt.write_to_block(line, &mut l.data)),
            None if self.backing_store => {
                self.functional_memory_write(pkt);
                1
            }
            None => 0,
        }
    }

    fn functional_write_buffers(&mut self, pkt: &Packet) -> u32 {
        let line = self.line_of(pkt.addr);
        let mut written = 0;
        for (addr, data) in self.buffers.iter_mut().filter(|(a, _)| *a == line) {
            written += u32::from(pkt.write_to_block(*addr, data));
        }
        written
    }

    fn functional_memory_write(&mut self, pkt: &Packet) {
        let line = self.line_of(pkt.addr);
        let size = self.block_size;
        let block = self.memory.entry(line).or_insert_with(|| vec![0; size]);
        let _ = pkt.write_to_block(line, block);
    }

    fn record_cache_trace(&self, idx: usize, recorder: &mut CacheRecorder) {
        for (line, l) in &self.lines {
            let (kind, write_mask) = match l.perm {
                AccessPermission::ReadWrite => {
                    (RequestType::Store, WriteMask::full(l.data.len()))
                }
                AccessPermission::ReadOnly => (RequestType::Load, WriteMask::empty(l.data.len())),
                _ => continue,
            };
            recorder.add_record(TraceRecord {
                cntrl: idx,
                data_address: *line,
                pc: 0,
                kind,
                data: l.data.clone(),
                write_mask,
            });
        }
    }

    fn warmup(&mut self, record: &TraceRecord) {
        let perm = match record.kind {
            RequestType::Store => AccessPermission::ReadWrite,
            RequestType::Load | RequestType::IFetch => AccessPermission::ReadOnly,
        };
        self.set_line(record.data_address, perm, record.data.clone());
    }
}
