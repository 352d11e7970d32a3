//! Register-level ISA interface.
//!
//! The pipeline is not specialized per instruction set. Everything it needs to
//! know about an ISA's registers is injected at construction through
//! `RegisterIsa`. It provides:
//! 1. **Register Classes:** Architectural register counts per class.
//! 2. **Zero Registers:** Which architectural register of a class reads as constant zero.
//! 3. **Mode Predicate:** The vector renaming mode implied by a thread's status register.

use crate::common::{RegClass, VecMode};
use crate::config::IsaConfig;

/// Register capabilities of an instruction set.
pub trait RegisterIsa: std::fmt::Debug {
    /// Architectural registers in `class`. `VecElem` counts every lane of every vector.
    fn arch_regs(&self, class: RegClass) -> usize;

    /// Lanes per vector register.
    fn elems_per_vec(&self) -> usize;

    /// Architectural zero register of `class`, if the ISA defines one.
    fn zero_reg(&self, class: RegClass) -> Option<u16>;

    /// Vector renaming mode for a thread whose status register holds `status`.
    fn rename_mode(&self, status: u64) -> VecMode;

    /// Vector renaming mode at reset.
    fn initial_mode(&self) -> VecMode;
}

/// Table-driven ISA built from configuration.
///
/// Bit 0 of the status register selects per-element vector renaming.
#[derive(Debug, Clone)]
pub struct GenericIsa {
    config: IsaConfig,
}

impl GenericIsa {
    /// Status register bit selecting per-element vector renaming.
    pub const ELEM_MODE_BIT: u64 = 1;

    /// Wraps an ISA configuration.
    pub const fn new(config: IsaConfig) -> Self {
        Self { config }
    }
}

impl RegisterIsa for GenericIsa {
    fn arch_regs(&self, class: RegClass) -> usize {
        self.config.arch_regs(class)
    }

    fn elems_per_vec(&self) -> usize {
        self.config.elems_per_vec
    }

    fn zero_reg(&self, class: RegClass) -> Option<u16> {
        match class {
            RegClass::Int => self.config.int_zero_reg,
            RegClass::Float => self.config.float_zero_reg,
            _ => None,
        }
    }

    fn rename_mode(&self, status: u64) -> VecMode {
        if status & Self::ELEM_MODE_BIT == 0 {
            VecMode::Full
        } else {
            VecMode::Elem
        }
    }

    fn initial_mode(&self) -> VecMode {
        self.config.initial_vec_mode
    }
}
