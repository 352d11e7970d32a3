//! Register access from outside the pipeline.
//!
//! Architectural accesses resolve through the commit rename map, so they see
//! the retired state of a thread and ignore anything in flight. Writes to a
//! shared zero register are dropped.

use super::Cpu;
use crate::common::{PhysRegId, RegId, SimResult, ThreadId, VecMode};

impl Cpu {
    /// Reads a physical register.
    #[inline]
    pub fn read_reg(&self, reg: PhysRegId) -> u64 {
        self.state.regfile.read(reg)
    }

    /// Writes a physical register.
    #[inline]
    pub fn set_reg(&mut self, reg: PhysRegId, val: u64) {
        self.state.regfile.set(reg, val);
    }

    /// Reads the committed value of an architectural register of `tid`.
    pub fn read_arch_reg(&self, tid: ThreadId, reg: RegId) -> SimResult<u64> {
        let phys = self.state.commit_maps[tid].lookup(reg)?;
        Ok(self.state.regfile.read(phys))
    }

    /// Overwrites the committed value of an architectural register of `tid`.
    pub fn set_arch_reg(&mut self, tid: ThreadId, reg: RegId, val: u64) -> SimResult<()> {
        let phys = self.state.commit_maps[tid].lookup(reg)?;
        if !self.state.is_zero(phys) {
            self.state.regfile.set(phys, val);
        }
        Ok(())
    }

    /// Reads every lane of architectural vector register `index` of `tid`.
    ///
    /// In element mode the lanes are gathered from their individual mappings.
    pub fn read_arch_vec_reg(&self, tid: ThreadId, index: u16) -> SimResult<Vec<u64>> {
        let map = &self.state.commit_maps[tid];
        match self.state.vec_mode {
            VecMode::Full => {
                let phys = map.lookup(RegId::vec(index))?;
                Ok(self.state.regfile.read_vec(phys).to_vec())
            }
            VecMode::Elem => (0..self.state.regfile.elems_per_vec())
                .map(|lane| {
                    map.lookup(RegId::vec_elem(index, lane as u16))
                        .map(|p| self.state.regfile.read(p))
                })
                .collect(),
        }
    }

    /// Overwrites the lanes of architectural vector register `index` of `tid`.
    pub fn set_arch_vec_reg(&mut self, tid: ThreadId, index: u16, lanes: &[u64]) -> SimResult<()> {
        match self.state.vec_mode {
            VecMode::Full => {
                let phys = self.state.commit_maps[tid].lookup(RegId::vec(index))?;
                self.state.regfile.set_vec(phys, lanes);
            }
            VecMode::Elem => {
                let elems = self.state.regfile.elems_per_vec();
                for (lane, val) in lanes.iter().take(elems).enumerate() {
                    let reg = RegId::vec_elem(index, lane as u16);
                    let phys = self.state.commit_maps[tid].lookup(reg)?;
                    self.state.regfile.set(phys, *val);
                }
            }
        }
        Ok(())
    }
}
