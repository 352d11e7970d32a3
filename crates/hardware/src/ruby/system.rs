//! Functional read/write arbiter.
//!
//! Functional accesses bypass the timing protocol and must find the data wherever it
//! currently lives: in a cache, in the memory behind a directory, in a message
//! crossing the network, or in a message queued inside a controller. It provides:
//! 1. **Registration:** Controllers and the network, indexed by `MachineId`.
//! 2. **Functional Read:** Permission-based choice of the copy to read.
//! 3. **Functional Write:** Best-effort fan-out to every copy.
//! 4. **Checkpointing:** Memory writeback from a cache trace, and warmup replay.

use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use super::controller::CoherenceController;
use super::network::Network;
use super::packet::Packet;
use super::recorder::{CacheRecorder, CacheTrace, RequestType, TraceRecord};
use super::{AccessPermission, MachineId, MachineType};
use crate::common::{SimError, SimResult};
use crate::config::RubyConfig;

/// Permission counts of every controller for one line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PermissionCounts {
    ro: usize,
    rw: usize,
    busy: usize,
    backing_store: usize,
    invalid: usize,
}

/// The coherence subsystem as seen by functional accesses and checkpointing.
pub struct RubySystem {
    config: RubyConfig,
    network: Option<Box<dyn Network>>,
    controllers: Vec<Box<dyn CoherenceController>>,
    machine_map: HashMap<MachineId, usize>,
    recorder: Option<CacheRecorder>,
    warmup_enabled: bool,
    warned_writeback: bool,
}

impl std::fmt::Debug for RubySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RubySystem")
            .field("block_size_bytes", &self.config.block_size_bytes)
            .field("controllers", &self.controllers.len())
            .field("has_network", &self.network.is_some())
            .field("warmup_enabled", &self.warmup_enabled)
            .finish_non_exhaustive()
    }
}

impl RubySystem {
    /// Creates a system with no controllers and no network.
    ///
    /// # Returns
    ///
    /// `SimError::InvalidConfig` if the block size is not a power of two.
    pub fn new(config: RubyConfig) -> SimResult<Self> {
        if !config.block_size_bytes.is_power_of_two() {
            return Err(SimError::InvalidConfig(format!(
                "block_size_bytes {} is not a power of two",
                config.block_size_bytes
            )));
        }
        Ok(Self {
            config,
            network: None,
            controllers: Vec::new(),
            machine_map: HashMap::new(),
            recorder: None,
            warmup_enabled: false,
            warned_writeback: false,
        })
    }

    /// Coherence block size in bytes.
    pub const fn block_size_bytes(&self) -> u64 {
        self.config.block_size_bytes
    }

    /// Returns true while a restored trace waits to be replayed.
    pub const fn warmup_enabled(&self) -> bool {
        self.warmup_enabled
    }

    /// Number of registered controllers.
    pub fn num_controllers(&self) -> usize {
        self.controllers.len()
    }

    /// Controller registered at `idx`.
    pub fn controller(&self, idx: usize) -> Option<&dyn CoherenceController> {
        self.controllers.get(idx).map(Box::as_ref)
    }

    /// Controller registered under `id`.
    pub fn controller_by_id(&self, id: MachineId) -> Option<&dyn CoherenceController> {
        self.machine_map.get(&id).and_then(|idx| self.controller(*idx))
    }

    /// Attaches the network, replacing any earlier one.
    pub fn register_network(&mut self, network: Box<dyn Network>) {
        self.network = Some(network);
    }

    /// Attaches a controller. Returns its index.
    pub fn register_abstract_controller(&mut self, cntrl: Box<dyn CoherenceController>) -> usize {
        let idx = self.controllers.len();
        let id = cntrl.machine_id();
        if self.machine_map.insert(id, idx).is_some() {
            warn!(machine = %id, "controller registered twice; the later one shadows it");
        }
        self.controllers.push(cntrl);
        idx
    }

    fn count_permissions(&self, line: u64) -> (PermissionCounts, Vec<usize>) {
        let mut counts = PermissionCounts::default();
        let mut writers = Vec::new();
        for (idx, cntrl) in self.controllers.iter().enumerate() {
            match cntrl.access_permission(line) {
                AccessPermission::ReadOnly => counts.ro += 1,
                AccessPermission::ReadWrite => {
                    counts.rw += 1;
                    writers.push(idx);
                }
                AccessPermission::Busy => counts.busy += 1,
                AccessPermission::BackingStore => counts.backing_store += 1,
                AccessPermission::Invalid | AccessPermission::NotPresent => counts.invalid += 1,
            }
        }
        (counts, writers)
    }

    /// Reads `pkt` from whichever copy of its line is safe to read.
    ///
    /// Memory behind a backing store is trusted only when no cache holds the line.
    /// Otherwise any readable copy is used. With every holder in a transient state,
    /// messages in the network are searched, then every controller's stable state
    /// and queued messages.
    ///
    /// # Returns
    ///
    /// Whether any copy was found, or `SimError::CoherenceViolation` if more than
    /// one controller reports ReadWrite.
    pub fn functional_read(&mut self, pkt: &mut Packet) -> SimResult<bool> {
        let line = self.config.line_address(pkt.addr);
        let n = self.controllers.len();
        debug!(addr = format_args!("{:#x}", pkt.addr), "functional read");

        let (counts, writers) = self.count_permissions(line);
        if counts.rw > 1 {
            return Err(SimError::CoherenceViolation {
                line,
                controllers: writers,
            });
        }
        trace!(?counts, "permission counts");

        if counts.invalid + 1 == n && counts.backing_store == 1 {
            debug!("only copy in backing store, reading it");
            if let Some(cntrl) = self
                .controllers
                .iter()
                .find(|c| c.access_permission(line) == AccessPermission::BackingStore)
            {
                let _ = cntrl.functional_read(line, pkt);
                return Ok(true);
            }
        } else if counts.ro > 0 || counts.rw == 1 {
            if let Some(cntrl) = self.controllers.iter().find(|c| {
                matches!(
                    c.access_permission(line),
                    AccessPermission::ReadOnly | AccessPermission::ReadWrite
                )
            }) {
                let _ = cntrl.functional_read(line, pkt);
                return Ok(true);
            }
        } else {
            debug!(busy = counts.busy, "no readable copy, reading from the network");
            if let Some(net) = self.network.as_mut()
                && net.functional_read(pkt)
            {
                return Ok(true);
            }

            debug!("network does not have the data either");
            for cntrl in &self.controllers {
                if cntrl.functional_read(line, pkt) || cntrl.functional_read_buffers(pkt) {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Writes `pkt` into every copy of its line.
    ///
    /// Reaches each controller's queued messages, the stable state of each
    /// controller holding the line, and messages in the network. Coherence is not
    /// preserved beyond that.
    pub fn functional_write(&mut self, pkt: &Packet) -> bool {
        let line = self.config.line_address(pkt.addr);
        debug!(addr = format_args!("{:#x}", pkt.addr), "functional write");

        let mut written = 0u32;
        for cntrl in &mut self.controllers {
            written += cntrl.functional_write_buffers(pkt);
            if !cntrl.access_permission(line).is_invalid() {
                written += cntrl.functional_write(line, pkt);
            }
        }
        if let Some(net) = self.network.as_mut() {
            written += net.functional_write(pkt);
        }

        debug!(written, "functional write done");
        if written == 0 {
            warn!(
                addr = format_args!("{:#x}", pkt.addr),
                "functional write reached no copy of the line"
            );
        }
        true
    }

    fn directory_for(&self, line: u64) -> SimResult<usize> {
        let node = self
            .network
            .as_ref()
            .map_or(0, |net| net.address_to_node_id(line, MachineType::Directory));
        self.machine_map
            .get(&MachineId::new(MachineType::Directory, node))
            .copied()
            .ok_or(SimError::NoDirectory { line, node })
    }

    fn write_back_record(&mut self, rec: &TraceRecord) -> SimResult<()> {
        match rec.kind {
            // Memory already holds what loads read.
            RequestType::Load | RequestType::IFetch => return Ok(()),
            RequestType::Store if rec.write_mask.is_empty() => {
                return Err(SimError::InvalidTraceRecord {
                    line: rec.data_address,
                });
            }
            RequestType::Store => {}
        }

        let dir = self.directory_for(rec.data_address)?;
        let Some(directory) = self.controllers.get_mut(dir) else {
            return Err(SimError::NoDirectory {
                line: rec.data_address,
                node: dir,
            });
        };

        if rec.write_mask.is_full() {
            directory.functional_memory_write(&Packet::write(rec.data_address, &rec.data));
        } else {
            for (offset, byte) in rec.data.iter().enumerate() {
                if rec.write_mask.test(offset) {
                    let pkt = Packet::write(rec.data_address + offset as u64, &[*byte]);
                    directory.functional_memory_write(&pkt);
                }
            }
        }
        Ok(())
    }

    /// Writes every dirty cached line back to the memory behind its directory.
    ///
    /// The cache trace built for this is kept so a checkpoint taken right after
    /// can serialize it with `cache_trace`.
    pub fn mem_writeback(&mut self) -> SimResult<()> {
        debug!("recording cache trace");
        let mut recorder = CacheRecorder::new(self.config.block_size_bytes);
        for (idx, cntrl) in self.controllers.iter().enumerate() {
            cntrl.record_cache_trace(idx, &mut recorder);
        }
        debug!(records = recorder.num_records(), "cache trace complete");

        for idx in 0..recorder.num_records() {
            if let Some(rec) = recorder.record(idx) {
                self.write_back_record(rec)?;
            }
        }

        if !self.warned_writeback {
            warn!(
                "memory writeback is experimental; continuing simulation afterwards may not always work as intended"
            );
            self.warned_writeback = true;
        }
        self.recorder = Some(recorder);
        Ok(())
    }

    /// The cache trace recorded by the last `mem_writeback`.
    pub fn cache_trace(&self) -> SimResult<CacheTrace> {
        self.recorder
            .as_ref()
            .map(CacheRecorder::aggregate)
            .ok_or(SimError::NoCacheTrace)
    }

    /// Loads a checkpointed trace to be replayed by `startup`.
    ///
    /// A trace taken with another block size is re-split into the current one.
    pub fn restore_cache_trace(&mut self, trace: CacheTrace) {
        if trace.block_size_bytes != self.config.block_size_bytes {
            info!(
                from = trace.block_size_bytes,
                to = self.config.block_size_bytes,
                "restoring cache trace with a different block size"
            );
        }
        self.recorder = Some(CacheRecorder::from_trace(
            trace,
            self.config.block_size_bytes,
        ));
        self.warmup_enabled = true;
    }

    /// Replays a restored trace into the controllers.
    ///
    /// # Returns
    ///
    /// The number of records replayed; zero if no trace was restored.
    pub fn startup(&mut self) -> usize {
        if !self.warmup_enabled {
            return 0;
        }
        let Some(mut recorder) = self.recorder.take() else {
            self.warmup_enabled = false;
            return 0;
        };

        debug!("starting cache warmup");
        let mut replayed = 0;
        while let Some(rec) = recorder.next_fetch_request() {
            match self.controllers.get_mut(rec.cntrl) {
                Some(cntrl) => {
                    cntrl.warmup(rec);
                    replayed += 1;
                }
                None => warn!(cntrl = rec.cntrl, "trace record for unknown controller dropped"),
            }
        }
        self.warmup_enabled = false;
        info!(records = replayed, "cache warmup complete");
        replayed
    }

    /// Drops the trace recorded for a checkpoint.
    pub fn drain_resume(&mut self) {
        self.recorder = None;
    }
}
