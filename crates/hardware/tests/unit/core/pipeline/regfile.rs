//! # Physical Register File
//!
//! Classes occupy disjoint flat ranges, and the element class is a view onto
//! the lanes of the vector class.

use o3sim_core::common::RegClass;
use o3sim_core::config::CpuConfig;
use o3sim_core::core::pipeline::regfile::PhysRegFile;
use pretty_assertions::assert_eq;

fn small() -> PhysRegFile {
    let cfg = CpuConfig {
        num_phys_int_regs: 4,
        num_phys_float_regs: 2,
        num_phys_vec_regs: 2,
        num_phys_vec_pred_regs: 1,
        num_phys_cc_regs: 1,
        ..CpuConfig::default()
    };
    PhysRegFile::new(&cfg, 4)
}

/// Flat indices run Int, Float, Vec, VecElem, VecPred, CondCode.
#[test]
fn flat_indices_are_disjoint() {
    let rf = small();
    assert_eq!(rf.total_regs(), 4 + 2 + 2 + 8 + 1 + 1);
    assert_eq!(rf.reg(RegClass::Float, 0).flat, 4);
    assert_eq!(rf.reg(RegClass::VecElem, 0).flat, 8);
    assert_eq!(rf.reg(RegClass::CondCode, 0).flat, 17);
}

/// Element `p*E + l` reads and writes lane `l` of vector `p`.
#[test]
fn vec_elem_aliases_lanes() {
    let mut rf = small();
    let v1 = rf.reg(RegClass::Vec, 1);
    rf.set_vec(v1, &[10, 11, 12, 13]);
    assert_eq!(rf.read(rf.elem_of(v1, 2)), 12);

    rf.set(rf.reg(RegClass::VecElem, 5), 99);
    assert_eq!(rf.read_vec(v1), &[10, 99, 12, 13]);
}

/// A scalar write to a vector register fills every lane.
#[test]
fn vec_scalar_write_broadcasts() {
    let mut rf = small();
    let v0 = rf.reg(RegClass::Vec, 0);
    rf.set(v0, 7);
    assert_eq!(rf.read_vec(v0), &[7, 7, 7, 7]);
}
