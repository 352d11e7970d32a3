//! # Register Identity Tests
//!
//! Display names of architectural registers and which register classes each
//! vector renaming mode can address.

use o3sim_core::common::{RegClass, RegId, VecMode};
use pretty_assertions::assert_eq;

/// Architectural registers print with their class prefix, lanes in brackets.
#[test]
fn reg_id_display() {
    assert_eq!(RegId::int(3).to_string(), "r3");
    assert_eq!(RegId::vec_elem(1, 2).to_string(), "v1[2]");
    assert_eq!(RegId::cc(0).to_string(), "cc0");
}

/// Each mode addresses exactly one of the two vector views; scalars are always addressable.
#[test]
fn vec_mode_addressing() {
    assert!(VecMode::Full.addresses(RegClass::Vec));
    assert!(!VecMode::Full.addresses(RegClass::VecElem));
    assert!(VecMode::Elem.addresses(RegClass::VecElem));
    assert!(!VecMode::Elem.addresses(RegClass::Vec));
    assert!(VecMode::Elem.addresses(RegClass::Int));
}
