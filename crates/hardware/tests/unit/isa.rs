//! # Register ISA Tests

use o3sim_core::common::{RegClass, VecMode};
use o3sim_core::config::IsaConfig;
use o3sim_core::isa::{GenericIsa, RegisterIsa};
use pretty_assertions::assert_eq;

/// The default table gives 32 registers per class, 4 lanes and a zero integer register.
#[test]
fn generic_isa_from_defaults() {
    let isa = GenericIsa::new(IsaConfig::default());
    assert_eq!(isa.arch_regs(RegClass::Int), 32);
    assert_eq!(isa.arch_regs(RegClass::VecElem), 32 * 4);
    assert_eq!(isa.zero_reg(RegClass::Int), Some(0));
    assert_eq!(isa.zero_reg(RegClass::Vec), None);
}

/// Only the element-mode bit of the status register selects element renaming.
#[test]
fn rename_mode_predicate() {
    let isa = GenericIsa::new(IsaConfig::default());
    assert_eq!(isa.rename_mode(0), VecMode::Full);
    assert_eq!(isa.rename_mode(GenericIsa::ELEM_MODE_BIT), VecMode::Elem);
    assert_eq!(isa.rename_mode(0b10), VecMode::Full);
}
