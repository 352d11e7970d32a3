//! # Drain and Resume
//!
//! A drained core holds no instruction anywhere, stays drained when asked again,
//! and resumes exactly where the committed state left off.

use o3sim_core::common::SimError;
use o3sim_core::config::MemoryMode;
use o3sim_core::core::{CpuStatus, DrainState};
use o3sim_core::sim::event::CpuEvent;
use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, increments, small_config};

fn drain_fully(ctx: &mut TestContext) {
    let _ = ctx.cpu_mut().drain();
    let _ = ctx.run();
    assert_eq!(ctx.cpu().drain_state, DrainState::Drained);
}

#[test]
fn test_drain_mid_run_empties_pipeline() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 40)]);
    ctx.run_cycles(6);
    assert!(!ctx.cpu().state.inst_list.is_empty());

    assert_eq!(ctx.cpu_mut().drain(), DrainState::Draining);
    let _ = ctx.run();

    let cpu = ctx.cpu();
    assert_eq!(cpu.drain_state, DrainState::Drained);
    assert!(cpu.is_drained());
    assert!(cpu.state.rob.is_empty_all());
    assert!(!cpu.events.is_scheduled(CpuEvent::Tick));
    cpu.state.check_conservation().unwrap();
    assert!(cpu.total_insts() < 40);
    assert_eq!(ctx.int_reg(0, 1), cpu.total_insts());
}

#[test]
fn test_drain_is_idempotent() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 40)]);
    ctx.run_cycles(6);
    drain_fully(&mut ctx);

    let stats = ctx.cpu().stats().clone();
    let seq = ctx.cpu().state.global_seq;
    let tick = ctx.cpu().events.cur_tick();

    assert_eq!(ctx.cpu_mut().drain(), DrainState::Drained);
    assert_eq!(ctx.cpu_mut().drain(), DrainState::Drained);

    assert_eq!(ctx.cpu().stats(), &stats);
    assert_eq!(ctx.cpu().state.global_seq, seq);
    assert_eq!(ctx.cpu().events.cur_tick(), tick);
    assert!(ctx.cpu().events.is_empty());
}

#[test]
fn test_resume_completes_program() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 40)]);
    ctx.run_cycles(6);
    drain_fully(&mut ctx);

    ctx.cpu_mut().drain_resume().unwrap();
    assert_eq!(ctx.cpu().drain_state, DrainState::Running);
    assert_eq!(ctx.cpu().status, CpuStatus::Running);
    let _ = ctx.run();

    assert_eq!(ctx.int_reg(0, 1), 40);
    assert_eq!(ctx.cpu().total_insts(), 40);
}

#[test]
fn test_repeated_drains_keep_result() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 60)]);
    for _ in 0..3 {
        ctx.run_cycles(ctx.cpu().stats().cycles + 5);
        drain_fully(&mut ctx);
        ctx.cpu().state.check_conservation().unwrap();
        ctx.cpu_mut().drain_resume().unwrap();
    }
    let _ = ctx.run();

    assert_eq!(ctx.int_reg(0, 1), 60);
}

#[test]
fn test_drain_before_first_tick() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 10)]);
    let _ = ctx.cpu_mut().drain();
    let _ = ctx.run();

    assert_eq!(ctx.cpu().drain_state, DrainState::Drained);
    assert_eq!(ctx.cpu().total_insts(), 0);
    assert_eq!(ctx.cpu().state.source.position(0), 0);

    ctx.cpu_mut().drain_resume().unwrap();
    let _ = ctx.run();
    assert_eq!(ctx.int_reg(0, 1), 10);
}

#[test]
fn test_resume_requires_timing_mode() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 10)]);
    ctx.run_cycles(3);
    drain_fully(&mut ctx);

    ctx.cpu_mut().set_memory_mode(MemoryMode::Atomic);
    assert_eq!(
        ctx.cpu_mut().drain_resume(),
        Err(SimError::MemoryModeNotTiming)
    );

    ctx.cpu_mut().set_memory_mode(MemoryMode::Timing);
    ctx.cpu_mut().drain_resume().unwrap();
    let _ = ctx.run();
    assert_eq!(ctx.int_reg(0, 1), 10);
}

#[test]
fn test_switched_out_core_is_drained() {
    let mut config = small_config();
    config.cpu.switched_out = true;
    let mut ctx = TestContext::new(config, vec![increments(1, 10)]);

    assert_eq!(ctx.cpu().status, CpuStatus::SwitchedOut);
    assert_eq!(ctx.cpu_mut().drain(), DrainState::Drained);
    assert!(ctx.cpu().events.is_empty());
}

#[test]
fn test_drain_reactivates_suspended_thread() {
    let mut ctx = TestContext::new(small_config(), vec![increments(1, 10)]);
    ctx.cpu_mut().suspend_context(0).unwrap();
    assert_eq!(ctx.cpu().status, CpuStatus::Idle);

    let _ = ctx.cpu_mut().drain();
    let _ = ctx.run();

    assert_eq!(ctx.cpu().drain_state, DrainState::Drained);
    assert_eq!(ctx.cpu().active_threads, vec![0]);
}
