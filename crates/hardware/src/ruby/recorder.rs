//! Cache trace recording for checkpoints.
//!
//! Before a checkpoint, every controller records which lines it holds. The
//! trace is used twice: to write dirty data back to memory, and, after a
//! restore, to warm the caches up by replaying the accesses that recreate the
//! recorded state. It provides:
//! 1. **Records:** `TraceRecord`, one line with its data and write mask.
//! 2. **Recorder:** `CacheRecorder`, records for one writeback or one warmup.
//! 3. **Trace:** `CacheTrace`, the serializable form, tagged with its block size.

use serde::{Deserialize, Serialize};

/// Kind of access a record replays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    /// Data load; memory already holds the data.
    Load,
    /// Instruction fetch; memory already holds the data.
    IFetch,
    /// Store; memory may be stale.
    Store,
}

/// Bytes of a line written by a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteMask {
    bits: Vec<bool>,
}

impl WriteMask {
    /// Mask with every byte of a `len`-byte line set.
    pub fn full(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    /// Mask with no byte set.
    pub fn empty(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Marks byte `offset` as written.
    pub fn set(&mut self, offset: usize) {
        if let Some(bit) = self.bits.get_mut(offset) {
            *bit = true;
        }
    }

    /// Returns true if byte `offset` was written.
    pub fn test(&self, offset: usize) -> bool {
        self.bits.get(offset).copied().unwrap_or(false)
    }

    /// Returns true if every byte was written.
    pub fn is_full(&self) -> bool {
        self.bits.iter().all(|b| *b)
    }

    /// Returns true if no byte was written.
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    /// Mask length in bytes.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    fn slice(&self, start: usize, len: usize) -> Self {
        let end = (start + len).min(self.bits.len());
        let start = start.min(end);
        Self {
            bits: self.bits[start..end].to_vec(),
        }
    }
}

/// One recorded line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Index of the controller that held the line.
    pub cntrl: usize,
    /// Line address.
    pub data_address: u64,
    /// Program counter of the access, when known.
    pub pc: u64,
    /// Access to replay.
    pub kind: RequestType,
    /// Line contents.
    pub data: Vec<u8>,
    /// Bytes written by a store.
    pub write_mask: WriteMask,
}

/// Serializable cache trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTrace {
    /// Block size the trace was recorded with.
    pub block_size_bytes: u64,
    /// Recorded lines.
    pub records: Vec<TraceRecord>,
}

/// Records for one writeback, or the pending replays of one warmup.
#[derive(Clone, Debug, Default)]
pub struct CacheRecorder {
    records: Vec<TraceRecord>,
    block_size_bytes: u64,
    next: usize,
}

impl CacheRecorder {
    /// Empty recorder for lines of `block_size_bytes`.
    pub const fn new(block_size_bytes: u64) -> Self {
        Self {
            records: Vec::new(),
            block_size_bytes,
            next: 0,
        }
    }

    /// Recorder replaying `trace` with lines of `block_size_bytes`.
    ///
    /// Records of a trace taken with larger blocks are split into one record per
    /// current block; smaller records are kept as they are.
    pub fn from_trace(trace: CacheTrace, block_size_bytes: u64) -> Self {
        let mut recorder = Self::new(block_size_bytes);
        if trace.block_size_bytes <= block_size_bytes {
            recorder.records = trace.records;
            return recorder;
        }

        let step = block_size_bytes as usize;
        for rec in trace.records {
            for start in (0..trace.block_size_bytes as usize).step_by(step) {
                let end = (start + step).min(rec.data.len());
                recorder.records.push(TraceRecord {
                    cntrl: rec.cntrl,
                    data_address: rec.data_address + start as u64,
                    pc: rec.pc,
                    kind: rec.kind,
                    data: rec.data.get(start..end).map(<[u8]>::to_vec).unwrap_or_default(),
                    write_mask: rec.write_mask.slice(start, step),
                });
            }
        }
        recorder
    }

    /// Appends a record.
    pub fn add_record(&mut self, record: TraceRecord) {
        self.records.push(record);
    }

    /// Number of records.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Record at `idx`.
    pub fn record(&self, idx: usize) -> Option<&TraceRecord> {
        self.records.get(idx)
    }

    /// Block size of the records.
    pub const fn block_size_bytes(&self) -> u64 {
        self.block_size_bytes
    }

    /// Next record to replay during warmup.
    pub fn next_fetch_request(&mut self) -> Option<&TraceRecord> {
        let rec = self.records.get(self.next)?;
        self.next += 1;
        Some(rec)
    }

    /// Collects every record into a trace.
    pub fn aggregate(&self) -> CacheTrace {
        CacheTrace {
            block_size_bytes: self.block_size_bytes,
            records: self.records.clone(),
        }
    }
}
