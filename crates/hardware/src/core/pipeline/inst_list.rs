//! Arena of in-flight instructions.
//!
//! Every fetched instruction lives here until its removal is processed. It provides:
//! 1. **Storage:** Recycled slots indexed by sequence number.
//! 2. **Deferred Removal:** Committed and squashed instructions are queued and only
//!    erased by `clean_up`, run once at the end of a cycle, so squash walks never
//!    observe a shrinking list.
//! 3. **Ordered Walks:** Oldest-first and newest-first views per thread.

use std::collections::BTreeMap;

use crate::common::{SeqNum, ThreadId};
use crate::core::pipeline::dyn_inst::DynInst;

/// In-flight instruction list.
#[derive(Debug, Default)]
pub struct InstList {
    slots: Vec<Option<DynInst>>,
    index: BTreeMap<SeqNum, usize>,
    free_slots: Vec<usize>,
    remove_queue: Vec<SeqNum>,
}

impl InstList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `inst`, reusing a free slot when one exists. Returns its sequence number.
    pub fn insert(&mut self, inst: DynInst) -> SeqNum {
        let seq = inst.seq;
        let slot = if let Some(slot) = self.free_slots.pop() {
            self.slots[slot] = Some(inst);
            slot
        } else {
            self.slots.push(Some(inst));
            self.slots.len() - 1
        };
        let _ = self.index.insert(seq, slot);
        seq
    }

    /// Looks up an instruction.
    pub fn get(&self, seq: SeqNum) -> Option<&DynInst> {
        let slot = *self.index.get(&seq)?;
        self.slots[slot].as_ref()
    }

    /// Looks up an instruction mutably.
    pub fn get_mut(&mut self, seq: SeqNum) -> Option<&mut DynInst> {
        let slot = *self.index.get(&seq)?;
        self.slots[slot].as_mut()
    }

    /// Instructions not yet erased, including those queued for removal.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no instruction remains.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Queues `seq` for erasure at the next `clean_up`.
    pub fn queue_removal(&mut self, seq: SeqNum) {
        self.remove_queue.push(seq);
    }

    /// Returns true if removals are queued.
    #[inline]
    pub fn has_pending_removals(&self) -> bool {
        !self.remove_queue.is_empty()
    }

    /// Erases every queued instruction and recycles its slot. Returns the count erased.
    pub fn clean_up(&mut self) -> usize {
        let mut erased = 0;
        for seq in self.remove_queue.drain(..) {
            if let Some(slot) = self.index.remove(&seq) {
                self.slots[slot] = None;
                self.free_slots.push(slot);
                erased += 1;
            }
        }
        erased
    }

    /// All instructions, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DynInst> + '_ {
        self.index.values().filter_map(|slot| self.slots[*slot].as_ref())
    }

    /// Sequence numbers of `tid`'s instructions younger than `seq`, newest first.
    pub fn younger_than(&self, tid: ThreadId, seq: SeqNum) -> Vec<SeqNum> {
        self.index
            .range(seq.saturating_add(1)..)
            .rev()
            .filter(|(_, slot)| self.slots[**slot].as_ref().is_some_and(|i| i.tid == tid))
            .map(|(s, _)| *s)
            .collect()
    }

    /// Oldest in-flight instruction of `tid`.
    pub fn head(&self, tid: ThreadId) -> Option<&DynInst> {
        self.iter().find(|i| i.tid == tid && i.is_in_flight())
    }

    /// In-flight instructions of `tid`.
    pub fn count_in_flight(&self, tid: ThreadId) -> usize {
        self.iter()
            .filter(|i| i.tid == tid && i.is_in_flight())
            .count()
    }
}
