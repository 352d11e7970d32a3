//! Unified physical register file.
//!
//! Storage for every physical register of every class. It provides:
//! 1. **Layout:** Per-class sizes and a flat index space shared with the scoreboard and free list.
//! 2. **Values:** Scalar storage per register, lane storage for vector registers.
//! 3. **Aliasing:** Vector-element registers are views onto vector lanes, so physical
//!    element `p * E + l` is lane `l` of physical vector register `p`.

use crate::common::{PhysRegId, RegClass};
use crate::config::CpuConfig;

/// Physical register storage for all classes.
#[derive(Debug, Clone)]
pub struct PhysRegFile {
    counts: [usize; RegClass::COUNT],
    bases: [u32; RegClass::COUNT],
    elems_per_vec: usize,
    int: Vec<u64>,
    float: Vec<u64>,
    /// Lane storage, `num_vec * elems_per_vec` entries.
    lanes: Vec<u64>,
    vec_pred: Vec<u64>,
    cc: Vec<u64>,
}

impl PhysRegFile {
    /// Creates a zeroed register file sized from the core configuration.
    pub fn new(cfg: &CpuConfig, elems_per_vec: usize) -> Self {
        let mut counts = [0; RegClass::COUNT];
        let mut bases = [0; RegClass::COUNT];
        let mut next = 0u32;
        for class in RegClass::ALL {
            counts[class.idx()] = cfg.phys_regs(class, elems_per_vec);
            bases[class.idx()] = next;
            next += counts[class.idx()] as u32;
        }

        Self {
            counts,
            bases,
            elems_per_vec,
            int: vec![0; cfg.num_phys_int_regs],
            float: vec![0; cfg.num_phys_float_regs],
            lanes: vec![0; cfg.num_phys_vec_regs * elems_per_vec],
            vec_pred: vec![0; cfg.num_phys_vec_pred_regs],
            cc: vec![0; cfg.num_phys_cc_regs],
        }
    }

    /// Physical registers in `class`.
    #[inline]
    pub const fn num_regs(&self, class: RegClass) -> usize {
        self.counts[class.idx()]
    }

    /// Size of the flat index space.
    pub fn total_regs(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Lanes per vector register.
    #[inline]
    pub const fn elems_per_vec(&self) -> usize {
        self.elems_per_vec
    }

    /// Identity of register `index` of `class`.
    #[inline]
    pub const fn reg(&self, class: RegClass, index: usize) -> PhysRegId {
        PhysRegId {
            class,
            index: index as u32,
            flat: self.bases[class.idx()] + index as u32,
        }
    }

    /// Every register of `class`, lowest index first.
    pub fn regs(&self, class: RegClass) -> impl Iterator<Item = PhysRegId> + '_ {
        (0..self.num_regs(class)).map(move |i| self.reg(class, i))
    }

    /// The element register aliasing lane `lane` of vector register `vec`.
    #[inline]
    pub const fn elem_of(&self, vec: PhysRegId, lane: usize) -> PhysRegId {
        self.reg(RegClass::VecElem, vec.index as usize * self.elems_per_vec + lane)
    }

    /// Reads a scalar value. Vector registers yield lane 0.
    pub fn read(&self, reg: PhysRegId) -> u64 {
        let i = reg.index as usize;
        match reg.class {
            RegClass::Int => self.int[i],
            RegClass::Float => self.float[i],
            RegClass::Vec => self.lanes[i * self.elems_per_vec],
            RegClass::VecElem => self.lanes[i],
            RegClass::VecPred => self.vec_pred[i],
            RegClass::CondCode => self.cc[i],
        }
    }

    /// Writes a scalar value. Vector registers broadcast it to every lane.
    pub fn set(&mut self, reg: PhysRegId, val: u64) {
        let i = reg.index as usize;
        match reg.class {
            RegClass::Int => self.int[i] = val,
            RegClass::Float => self.float[i] = val,
            RegClass::Vec => {
                let e = self.elems_per_vec;
                self.lanes[i * e..(i + 1) * e].fill(val);
            }
            RegClass::VecElem => self.lanes[i] = val,
            RegClass::VecPred => self.vec_pred[i] = val,
            RegClass::CondCode => self.cc[i] = val,
        }
    }

    /// Lanes of a vector register.
    pub fn read_vec(&self, reg: PhysRegId) -> &[u64] {
        debug_assert_eq!(reg.class, RegClass::Vec);
        let e = self.elems_per_vec;
        let i = reg.index as usize;
        &self.lanes[i * e..(i + 1) * e]
    }

    /// Overwrites the lanes of a vector register. Extra input lanes are ignored.
    pub fn set_vec(&mut self, reg: PhysRegId, vals: &[u64]) {
        debug_assert_eq!(reg.class, RegClass::Vec);
        let e = self.elems_per_vec;
        let i = reg.index as usize;
        for (lane, v) in self.lanes[i * e..(i + 1) * e].iter_mut().zip(vals) {
            *lane = *v;
        }
    }
}
