//! Architectural-to-physical register map.
//!
//! Every thread owns two of these: the speculative map written by rename and the
//! commit map written at retirement. It provides:
//! 1. **Lookup:** Total mapping for every architectural register addressable in the
//!    current vector mode.
//! 2. **Update:** `set_entry` overwrites a mapping and hands back the previous one so the
//!    caller decides whether to free it (commit) or keep it for undo (rename).
//! 3. **Vector Views:** Whole-register and per-lane tables, only one of which is live.

use crate::common::{PhysRegId, RegClass, RegId, SimError, SimResult, VecMode};

/// Per-thread register alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameMap {
    /// Dense per-class tables. `VecElem` slots are `vec * elems_per_vec + lane`.
    tables: [Vec<PhysRegId>; RegClass::COUNT],
    elems_per_vec: usize,
    mode: VecMode,
}

impl RenameMap {
    /// Builds a map from fully populated per-class tables.
    ///
    /// The table of the vector class the mode does not address should be empty.
    pub const fn from_tables(
        tables: [Vec<PhysRegId>; RegClass::COUNT],
        elems_per_vec: usize,
        mode: VecMode,
    ) -> Self {
        Self {
            tables,
            elems_per_vec,
            mode,
        }
    }

    /// Current vector addressing mode.
    #[inline]
    pub const fn mode(&self) -> VecMode {
        self.mode
    }

    fn slot(&self, reg: RegId) -> SimResult<usize> {
        if !self.mode.addresses(reg.class) {
            return Err(SimError::InactiveVecMode { reg });
        }
        Ok(match reg.class {
            RegClass::VecElem => reg.index as usize * self.elems_per_vec + reg.elem as usize,
            _ => reg.index as usize,
        })
    }

    /// Physical register currently backing `reg`.
    ///
    /// # Arguments
    ///
    /// * `reg` - Architectural register. Must be addressable in the current mode.
    ///
    /// # Returns
    ///
    /// The mapped register, or `InactiveVecMode` for the disabled vector view.
    pub fn lookup(&self, reg: RegId) -> SimResult<PhysRegId> {
        let slot = self.slot(reg)?;
        Ok(self.tables[reg.class.idx()][slot])
    }

    /// Points `reg` at `phys` and returns the previous mapping.
    pub fn set_entry(&mut self, reg: RegId, phys: PhysRegId) -> SimResult<PhysRegId> {
        let slot = self.slot(reg)?;
        Ok(std::mem::replace(
            &mut self.tables[reg.class.idx()][slot],
            phys,
        ))
    }

    /// All mappings of `class`, in architectural order.
    #[inline]
    pub fn entries(&self, class: RegClass) -> &[PhysRegId] {
        &self.tables[class.idx()]
    }

    /// Replaces the tables of both vector views and switches the addressing mode.
    pub fn switch_mode(
        &mut self,
        mode: VecMode,
        vec: Vec<PhysRegId>,
        vec_elem: Vec<PhysRegId>,
    ) {
        self.tables[RegClass::Vec.idx()] = vec;
        self.tables[RegClass::VecElem.idx()] = vec_elem;
        self.mode = mode;
    }
}
