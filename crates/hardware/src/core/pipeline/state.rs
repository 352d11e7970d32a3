//! State shared by every pipeline stage.
//!
//! `CoreState` bundles the structures several stages touch in the same cycle, so
//! each stage can borrow it mutably in turn. It also owns the physical register
//! lifecycle. It provides:
//! 1. **Construction:** Register file sizing checks, shared zero registers, initial
//!    per-thread mappings for both rename maps.
//! 2. **Commit:** Freeing an instruction's old mappings and advancing the commit map.
//! 3. **Squash:** Newest-to-oldest undo of renames above a sequence number.
//! 4. **Vector Modes:** Re-deriving vector mappings when the addressing discipline changes.
//! 5. **Accounting:** The free + mapped = total conservation check.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::common::constants::FIRST_SEQ_NUM;
use crate::common::{
    PhysRegId, RegClass, RegId, SeqNum, SimError, SimResult, ThreadId, VecMode,
};
use crate::config::Config;
use crate::core::pipeline::activity::ActivityRecorder;
use crate::core::pipeline::dyn_inst::InstStatus;
use crate::core::pipeline::free_list::FreeList;
use crate::core::pipeline::inst_list::InstList;
use crate::core::pipeline::latches::{
    CommitComm, DecodeStruct, FetchStruct, IewStruct, RenameStruct, SquashComm, TimeStruct,
};
use crate::core::pipeline::port::{DcachePort, IcachePort, MessageHandler};
use crate::core::pipeline::regfile::PhysRegFile;
use crate::core::pipeline::rename_map::RenameMap;
use crate::core::pipeline::rob::Rob;
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::pipeline::time_buffer::TimeBuffer;
use crate::isa::RegisterIsa;
use crate::sim::source::InstSource;
use crate::stats::CpuStats;

/// Structures shared by the pipeline stages of one core.
#[derive(Debug)]
pub struct CoreState {
    /// Hardware thread contexts.
    pub num_threads: usize,
    /// Physical register values.
    pub regfile: PhysRegFile,
    /// Unallocated physical registers.
    pub free_list: FreeList,
    /// Physical register readiness.
    pub scoreboard: Scoreboard,
    /// Speculative map per thread, written at rename.
    pub rename_maps: Vec<RenameMap>,
    /// Committed map per thread, written at commit.
    pub commit_maps: Vec<RenameMap>,
    /// Shared zero register per class.
    pub zero_regs: [Option<PhysRegId>; RegClass::COUNT],
    /// Vector addressing mode of every map.
    pub vec_mode: VecMode,
    /// Architectural register counts per class.
    pub arch_regs: [usize; RegClass::COUNT],
    /// In-flight instructions.
    pub inst_list: InstList,
    /// Reorder buffer.
    pub rob: Rob,
    /// Next sequence number to hand out.
    pub global_seq: SeqNum,
    /// Instruction supply.
    pub source: Box<dyn InstSource>,
    /// Instruction cache port.
    pub icache: IcachePort,
    /// Data cache port.
    pub dcache: DcachePort,
    /// Backward feedback from later stages.
    pub time_buffer: TimeBuffer<TimeStruct>,
    /// Fetch to Decode.
    pub fetch_queue: TimeBuffer<FetchStruct>,
    /// Decode to Rename.
    pub decode_queue: TimeBuffer<DecodeStruct>,
    /// Rename to IEW.
    pub rename_queue: TimeBuffer<RenameStruct>,
    /// IEW to Commit.
    pub iew_queue: TimeBuffer<IewStruct>,
    /// Whether any stage moved an instruction recently.
    pub activity: ActivityRecorder,
    /// Performance counters.
    pub stats: CpuStats,
}

impl CoreState {
    /// Builds the register state and communication buffers for `config`.
    ///
    /// Every thread context gets a complete speculative and commit mapping, so
    /// both maps are total from the first cycle.
    pub fn new(
        config: &Config,
        isa: &dyn RegisterIsa,
        source: Box<dyn InstSource>,
    ) -> SimResult<Self> {
        let cpu = &config.cpu;
        let num_threads = cpu.num_threads;
        let elems = isa.elems_per_vec();

        let mut arch_regs = [0; RegClass::COUNT];
        for class in RegClass::ALL {
            arch_regs[class.idx()] = isa.arch_regs(class);
            let have = cpu.phys_regs(class, elems);
            let need = num_threads * arch_regs[class.idx()];
            if have < need {
                return Err(SimError::RegisterFileTooSmall { class, have, need });
            }
        }

        let regfile = PhysRegFile::new(cpu, elems);
        let total = regfile.total_regs();
        let vec_mode = isa.initial_mode();
        let mut free_list = FreeList::new(total);
        let mut scoreboard = Scoreboard::new(total);
        let mut zero_regs = [None; RegClass::COUNT];

        for class in RegClass::ALL.into_iter().filter(|c| vec_mode.addresses(*c)) {
            for reg in regfile.regs(class) {
                free_list.release(reg)?;
            }
            if let Some(z) = isa.zero_reg(class)
                && (z as usize) < arch_regs[class.idx()]
            {
                let reg = free_list.allocate(class)?;
                scoreboard.pin(reg);
                zero_regs[class.idx()] = Some(reg);
            }
        }

        let mut rename_maps = Vec::with_capacity(num_threads);
        for _ in 0..num_threads {
            let mut tables: [Vec<PhysRegId>; RegClass::COUNT] = Default::default();
            for class in RegClass::ALL.into_iter().filter(|c| vec_mode.addresses(*c)) {
                let zero = isa.zero_reg(class).map(usize::from);
                let table = &mut tables[class.idx()];
                for index in 0..arch_regs[class.idx()] {
                    let reg = match zero_regs[class.idx()] {
                        Some(z) if zero == Some(index) => z,
                        _ => free_list.allocate(class)?,
                    };
                    scoreboard.set_reg(reg);
                    table.push(reg);
                }
            }
            rename_maps.push(RenameMap::from_tables(tables, elems, vec_mode));
        }
        let commit_maps = rename_maps.clone();

        let back = cpu.back_com_size;
        let fwd = cpu.forward_com_size;
        let depth = back.max(fwd) + 1;

        info!(
            threads = num_threads,
            phys_regs = total,
            ?vec_mode,
            "register file initialized"
        );

        Ok(Self {
            num_threads,
            regfile,
            free_list,
            scoreboard,
            rename_maps,
            commit_maps,
            zero_regs,
            vec_mode,
            arch_regs,
            inst_list: InstList::new(),
            rob: Rob::new(num_threads, cpu.rob_entries),
            global_seq: FIRST_SEQ_NUM,
            source,
            icache: IcachePort::new(cpu.num_icache_ports),
            dcache: DcachePort::new(cpu.num_dcache_ports),
            time_buffer: TimeBuffer::new(back, back),
            fetch_queue: TimeBuffer::new(fwd, fwd),
            decode_queue: TimeBuffer::new(fwd, fwd),
            rename_queue: TimeBuffer::new(fwd, fwd),
            iew_queue: TimeBuffer::new(fwd, fwd),
            activity: ActivityRecorder::new(depth),
            stats: CpuStats::default(),
        })
    }

    /// Hands out the next sequence number.
    #[inline]
    pub fn next_seq(&mut self) -> SeqNum {
        let seq = self.global_seq;
        self.global_seq += 1;
        seq
    }

    /// Returns true if `reg` is one of the shared zero registers.
    #[inline]
    pub fn is_zero(&self, reg: PhysRegId) -> bool {
        self.zero_regs[reg.class.idx()] == Some(reg)
    }

    /// Restores both cache ports' per-cycle budgets.
    pub fn reset_ports(&mut self) {
        self.icache.reset();
        self.dcache.reset();
    }

    /// Advances every inter-stage buffer by one cycle.
    pub fn advance_buffers(&mut self) {
        self.time_buffer.advance();
        self.fetch_queue.advance();
        self.decode_queue.advance();
        self.rename_queue.advance();
        self.iew_queue.advance();
    }

    /// Advances every inter-stage buffer for its full depth.
    pub fn flush_buffers(&mut self) {
        self.time_buffer.flush();
        self.fetch_queue.flush();
        self.decode_queue.flush();
        self.rename_queue.flush();
        self.iew_queue.flush();
    }

    /// Retires instruction `seq` of `tid`.
    ///
    /// Frees every destination's old mapping (except shared zero registers),
    /// installs the new one in the commit map, pops the ROB head and queues the
    /// instruction for removal.
    pub fn commit_inst(&mut self, tid: ThreadId, seq: SeqNum) -> SimResult<()> {
        let inst = self
            .inst_list
            .get_mut(seq)
            .ok_or(SimError::InstNotFound { seq })?;
        inst.status = InstStatus::Committed;
        let records = std::mem::take(&mut inst.records);

        for rec in &records {
            let _ = self.commit_maps[tid].set_entry(rec.arch, rec.new)?;
            if !self.is_zero(rec.old) {
                self.free_list.release(rec.old)?;
            }
        }

        let head = self.rob.retire_head(tid);
        debug_assert_eq!(head, Some(seq));
        self.inst_list.queue_removal(seq);
        self.stats.committed_insts[tid] += 1;
        self.stats.committed_ops[tid] += 1;
        debug!(tid, sn = seq, "commit");
        Ok(())
    }

    /// Squashes every in-flight instruction of `tid` younger than `seq`.
    ///
    /// Instructions are undone newest first, and each instruction's records in
    /// reverse order, so when one architectural register was renamed several times
    /// the oldest squashed instruction's `old` mapping is the one left installed.
    /// The instruction source restarts at `rewind`, or at the oldest squashed
    /// instruction when `rewind` is `None`.
    ///
    /// # Returns
    ///
    /// The number of instructions squashed.
    pub fn squash_thread_after(
        &mut self,
        tid: ThreadId,
        seq: SeqNum,
        rewind: Option<u64>,
    ) -> SimResult<usize> {
        let mut squashed = 0;
        let mut oldest_pos = None;

        for victim in self.inst_list.younger_than(tid, seq) {
            let Some(inst) = self.inst_list.get_mut(victim) else {
                continue;
            };
            if !inst.is_in_flight() {
                continue;
            }
            inst.status = InstStatus::Squashed;
            oldest_pos = Some(inst.pos);
            let records = std::mem::take(&mut inst.records);

            for rec in records.iter().rev() {
                let _ = self.rename_maps[tid].set_entry(rec.arch, rec.old)?;
                if !self.is_zero(rec.new) {
                    self.free_list.release(rec.new)?;
                }
            }
            self.inst_list.queue_removal(victim);
            squashed += 1;
        }

        let _ = self.rob.squash_after(tid, seq);
        self.stats.squashed_insts += squashed as u64;

        if let Some(pos) = rewind.or(oldest_pos) {
            self.source.rewind(tid, pos);
            self.time_buffer.wire_mut(0).commit[tid].squash = Some(SquashComm {
                seq,
                rewind_pos: pos,
            });
        }

        debug!(tid, sn = seq, squashed, "squash");
        Ok(squashed)
    }

    /// Squashes every instruction of `tid` younger than its ROB tail.
    ///
    /// With an empty ROB there is no tail to anchor on, so everything from the head
    /// of the instruction list is squashed.
    pub fn remove_insts_not_in_rob(&mut self, tid: ThreadId) -> SimResult<usize> {
        let anchor = match self.rob.tail(tid) {
            Some(tail) => tail,
            None => match self.inst_list.head(tid) {
                Some(head) => head.seq - 1,
                None => return Ok(0),
            },
        };
        self.squash_thread_after(tid, anchor, None)
    }

    /// Checks that free and referenced registers add up to every class's size.
    ///
    /// Referenced registers are the union of both maps of every thread and the
    /// records of every in-flight instruction. Classes the vector mode disables
    /// must have nothing free or mapped.
    pub fn check_conservation(&self) -> SimResult<()> {
        for class in RegClass::ALL {
            let mut live: HashSet<PhysRegId> = HashSet::new();
            for map in self.rename_maps.iter().chain(&self.commit_maps) {
                live.extend(map.entries(class).iter().copied());
            }
            for inst in self.inst_list.iter().filter(|i| i.is_in_flight()) {
                for rec in inst.records.iter().filter(|r| r.arch.class == class) {
                    let _ = live.insert(rec.old);
                    let _ = live.insert(rec.new);
                }
            }

            let free = self.free_list.num_free(class);
            let total = if self.vec_mode.addresses(class) {
                self.regfile.num_regs(class)
            } else {
                0
            };
            let overlap = live.iter().any(|r| self.free_list.is_free(*r));
            if overlap || free + live.len() != total {
                return Err(SimError::RegisterLeak {
                    class,
                    free,
                    mapped: live.len(),
                    total,
                });
            }
        }
        Ok(())
    }

    /// Re-derives every thread's vector mappings for `mode`.
    ///
    /// Callers guarantee no instruction is in flight, so each thread's speculative
    /// and commit maps agree.
    ///
    /// * Full to Elem: each mapped vector register is split into its lane elements and
    ///   each free vector register into free elements. No values move.
    /// * Elem to Full: each architectural vector register's lanes are gathered and
    ///   written into vector register `tid * arch_vec + index`; every other vector
    ///   register becomes free.
    pub fn switch_vec_mode(&mut self, mode: VecMode) -> SimResult<()> {
        if mode == self.vec_mode {
            return Ok(());
        }
        self.check_conservation()?;

        let elems = self.regfile.elems_per_vec();
        let arch_vec = self.arch_regs[RegClass::Vec.idx()];

        match mode {
            VecMode::Elem => {
                for reg in self.free_list.take_class(RegClass::Vec) {
                    for lane in 0..elems {
                        self.free_list.release(self.regfile.elem_of(reg, lane))?;
                    }
                }
                for tid in 0..self.num_threads {
                    let vecs = self.commit_maps[tid].entries(RegClass::Vec).to_vec();
                    let lanes: Vec<PhysRegId> = vecs
                        .iter()
                        .flat_map(|v| (0..elems).map(|l| self.regfile.elem_of(*v, l)))
                        .collect();
                    for reg in &lanes {
                        self.scoreboard.set_reg(*reg);
                    }
                    self.rename_maps[tid].switch_mode(mode, Vec::new(), lanes.clone());
                    self.commit_maps[tid].switch_mode(mode, Vec::new(), lanes);
                }
            }
            VecMode::Full => {
                let mut gathered = Vec::with_capacity(self.num_threads);
                for tid in 0..self.num_threads {
                    let values: Vec<Vec<u64>> = (0..arch_vec)
                        .map(|v| {
                            (0..elems)
                                .map(|l| {
                                    let reg = RegId::vec_elem(v as u16, l as u16);
                                    self.commit_maps[tid]
                                        .lookup(reg)
                                        .map(|p| self.regfile.read(p))
                                })
                                .collect::<SimResult<Vec<u64>>>()
                        })
                        .collect::<SimResult<_>>()?;
                    gathered.push(values);
                }

                let _ = self.free_list.take_class(RegClass::VecElem);
                let used = self.num_threads * arch_vec;
                for index in used..self.regfile.num_regs(RegClass::Vec) {
                    self.free_list
                        .release(self.regfile.reg(RegClass::Vec, index))?;
                }

                for (tid, values) in gathered.into_iter().enumerate() {
                    let mut table = Vec::with_capacity(arch_vec);
                    for (v, lanes) in values.iter().enumerate() {
                        let reg = self.regfile.reg(RegClass::Vec, tid * arch_vec + v);
                        self.regfile.set_vec(reg, lanes);
                        self.scoreboard.set_reg(reg);
                        table.push(reg);
                    }
                    self.rename_maps[tid].switch_mode(mode, table.clone(), Vec::new());
                    self.commit_maps[tid].switch_mode(mode, table, Vec::new());
                }
            }
        }

        self.vec_mode = mode;
        self.stats.mode_switches += 1;
        self.check_conservation()?;
        info!(?mode, "vector renaming mode switched");
        Ok(())
    }

    /// Drops every entry belonging to `tid` from the inter-stage buffers.
    ///
    /// The buffers are shared by all threads, so instead of advancing them for
    /// their full depth only the departing thread's payloads are cleared.
    pub fn purge_thread_buffers(&mut self, tid: ThreadId) {
        for slot in self.time_buffer.slots_mut() {
            slot.commit[tid] = CommitComm::default();
            slot.decode_block[tid] = false;
            slot.rename_block[tid] = false;
            slot.iew_block[tid] = false;
        }

        let insts = &self.inst_list;
        let keep = |seq: &SeqNum| insts.get(*seq).is_some_and(|i| i.tid != tid);
        for slot in self.fetch_queue.slots_mut() {
            slot.insts.retain(|s| keep(s));
        }
        for slot in self.decode_queue.slots_mut() {
            slot.insts.retain(|s| keep(s));
        }
        for slot in self.rename_queue.slots_mut() {
            slot.insts.retain(|s| keep(s));
        }
        for slot in self.iew_queue.slots_mut() {
            slot.executed.retain(|s| keep(s));
            slot.mispredicts.retain(|s| keep(s));
        }
    }

    /// Points `tid`'s speculative map back at its commit map.
    ///
    /// Only valid with no in-flight instruction for `tid`. The committed registers
    /// are marked ready.
    pub fn reset_speculative_map(&mut self, tid: ThreadId) {
        self.rename_maps[tid] = self.commit_maps[tid].clone();
        for class in RegClass::ALL {
            for reg in self.commit_maps[tid].entries(class) {
                self.scoreboard.set_reg(*reg);
            }
        }
    }
}
