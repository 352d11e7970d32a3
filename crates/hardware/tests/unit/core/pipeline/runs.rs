//! # Pipeline Runs
//!
//! Whole programs through fetch, decode, rename, IEW and commit. Speculation and
//! recovery must never change the committed result.

use o3sim_core::common::{Fault, RegClass, RegId, SimError, VecMode};
use o3sim_core::sim::event::CpuEvent;
use o3sim_core::sim::simulator::ExitReason;
use o3sim_core::sim::source::StaticInst;
use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, increments, small_config};

#[test]
fn test_dependent_chain_commits_in_order() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 50)]);
    assert_eq!(ctx.run(), ExitReason::Finished);

    assert_eq!(ctx.int_reg(0, 1), 50);
    assert_eq!(ctx.cpu().stats().committed_insts[0], 50);
    assert_eq!(ctx.cpu().total_ops(), 50);
    assert!(ctx.cpu().is_drained());
    ctx.cpu().state.check_conservation().unwrap();
}

#[test]
fn test_independent_registers() {
    let program = vec![
        StaticInst::alu(RegId::int(1), &[], 7),
        StaticInst::alu(RegId::int(2), &[], 5),
        StaticInst::alu(RegId::int(3), &[RegId::int(1), RegId::int(2)], 0),
        StaticInst::alu(RegId::int(1), &[RegId::int(3)], 100),
    ];
    let mut ctx = TestContext::new(small_config(), vec![program]);
    let _ = ctx.run();

    assert_eq!(ctx.int_reg(0, 1), 112);
    assert_eq!(ctx.int_reg(0, 2), 5);
    assert_eq!(ctx.int_reg(0, 3), 12);
}

#[test]
fn test_mispredicted_branch_does_not_change_result() {
    let mut program = increments(1, 3);
    program.push(StaticInst::branch(&[RegId::int(1)], true));
    program.extend(increments(1, 3));

    let mut ctx = TestContext::new(small_config(), vec![program]);
    let _ = ctx.run();

    let stats = ctx.cpu().stats();
    assert_eq!(ctx.int_reg(0, 1), 6);
    assert_eq!(stats.branch_mispredicts, 1);
    assert_eq!(stats.committed_insts[0], 7);
    assert!(stats.squashed_insts > 0);
    assert!(stats.fetched_insts > 7);
}

#[test]
fn test_correct_branch_squashes_nothing() {
    let mut program = increments(1, 2);
    program.push(StaticInst::branch(&[RegId::int(1)], false));
    program.extend(increments(1, 2));

    let mut ctx = TestContext::new(small_config(), vec![program]);
    let _ = ctx.run();

    assert_eq!(ctx.int_reg(0, 1), 4);
    assert_eq!(ctx.cpu().stats().branch_mispredicts, 0);
    assert_eq!(ctx.cpu().stats().squashed_insts, 0);
}

#[test]
fn test_faulting_instruction_is_skipped() {
    let program = vec![
        StaticInst::alu(RegId::int(1), &[RegId::int(1)], 1),
        StaticInst::alu(RegId::int(1), &[RegId::int(1)], 1).with_fault(Fault::IllegalInstruction),
        StaticInst::alu(RegId::int(1), &[RegId::int(1)], 1),
    ];
    let mut ctx = TestContext::new(small_config(), vec![program]);
    let _ = ctx.run();

    assert_eq!(ctx.int_reg(0, 1), 2);
    assert_eq!(ctx.cpu().stats().faults, 1);
    assert_eq!(ctx.cpu().stats().committed_insts[0], 2);
    ctx.cpu().state.check_conservation().unwrap();
}

#[test]
fn test_squash_from_thread_context_replays() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 30)]);
    ctx.run_cycles(4);
    ctx.cpu_mut().squash_from_tc(0);
    let _ = ctx.run();

    assert_eq!(ctx.int_reg(0, 1), 30);
    assert_eq!(ctx.cpu().total_insts(), 30);
}

#[test]
fn test_status_write_switches_to_element_renaming() {
    let mut ctx = TestContext::new(small_config(), vec![vec![
        StaticInst::alu(RegId::int(1), &[RegId::int(1)], 1),
        StaticInst::write_status(1),
        StaticInst::alu(RegId::int(1), &[RegId::int(1)], 1),
    ]]);
    ctx.cpu_mut().set_arch_vec_reg(0, 3, &[1, 2, 3, 4]).unwrap();
    let vec_free = ctx.cpu().state.free_list.num_free(RegClass::Vec);
    assert!(vec_free > 0);

    let _ = ctx.run();

    let cpu = ctx.cpu();
    assert_eq!(cpu.state.vec_mode, VecMode::Elem);
    assert_eq!(cpu.stats().mode_switches, 1);
    assert_eq!(cpu.thread_regs[0], 1);
    assert_eq!(cpu.read_arch_vec_reg(0, 3).unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(cpu.state.free_list.num_free(RegClass::Vec), 0);
    assert_eq!(
        cpu.state.free_list.num_free(RegClass::VecElem),
        vec_free * cpu.state.regfile.elems_per_vec()
    );
    assert_eq!(ctx.int_reg(0, 1), 2);
    cpu.state.check_conservation().unwrap();
}

#[test]
fn test_mode_switch_round_trip_preserves_vectors() {
    let mut ctx = TestContext::new(small_config(), vec![vec![
        StaticInst::write_status(1),
        StaticInst::write_status(0),
    ]]);
    ctx.cpu_mut().set_arch_vec_reg(0, 0, &[9, 8, 7, 6]).unwrap();
    ctx.cpu_mut().set_arch_vec_reg(0, 5, &[10, 20, 30, 40]).unwrap();

    let _ = ctx.run();

    let cpu = ctx.cpu();
    assert_eq!(cpu.state.vec_mode, VecMode::Full);
    assert_eq!(cpu.stats().mode_switches, 2);
    assert_eq!(cpu.read_arch_vec_reg(0, 0).unwrap(), vec![9, 8, 7, 6]);
    assert_eq!(cpu.read_arch_vec_reg(0, 5).unwrap(), vec![10, 20, 30, 40]);
    cpu.state.check_conservation().unwrap();
}

#[test]
fn test_status_write_without_mode_change() {
    let mut ctx = TestContext::new(small_config(), vec![vec![StaticInst::write_status(2)]]);
    let _ = ctx.run();

    assert_eq!(ctx.cpu().thread_regs[0], 2);
    assert_eq!(ctx.cpu().state.vec_mode, VecMode::Full);
    assert_eq!(ctx.cpu().stats().mode_switches, 0);
}

#[test]
fn test_single_dcache_port_retries() {
    let mut config = small_config();
    config.cpu.num_dcache_ports = 1;
    let program = (0..4u64)
        .map(|i| StaticInst {
            op: o3sim_core::sim::source::OpClass::MemRead,
            dests: vec![RegId::int(1 + (i % 3) as u16)],
            imm: 0x100 + i * 8,
            ..StaticInst::default()
        })
        .collect();
    let mut ctx = TestContext::new(config, vec![program]);
    let _ = ctx.run();

    assert_eq!(ctx.cpu().total_insts(), 4);
    assert!(ctx.cpu().stats().dcache_retries > 0);
    assert_eq!(ctx.int_reg(0, 1), 0x118);
}

#[test]
fn test_register_file_without_rename_registers_is_fatal() {
    let mut config = small_config();
    config.cpu.num_phys_int_regs = 4;
    let mut ctx = TestContext::new(config, vec![increments(1, 5)]);

    assert_eq!(
        ctx.sim.run(),
        Err(SimError::FreeListExhausted {
            class: RegClass::Int
        })
    );
    assert_eq!(ctx.cpu().total_insts(), 0);
    assert!(ctx.cpu().stats().rename_full_stalls > 0);
}

#[test]
fn test_stopped_core_with_work_left_is_an_error() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 30)]);
    ctx.run_cycles(4);
    ctx.cpu_mut().events.deschedule(CpuEvent::Tick);

    let in_flight = ctx.cpu().state.inst_list.count_in_flight(0);
    assert!(in_flight > 0);
    assert_eq!(
        ctx.sim.run(),
        Err(SimError::PipelineStalled { tid: 0, in_flight })
    );
}
