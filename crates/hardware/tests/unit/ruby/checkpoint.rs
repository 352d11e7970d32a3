//! # Checkpoint Support
//!
//! Dirty lines written back to the memory of their home directory, cache traces
//! serialized with a checkpoint, and warmup replay after a restore.

use o3sim_core::common::SimError;
use o3sim_core::config::RubyConfig;
use o3sim_core::ruby::{
    AccessPermission, CacheRecorder, CacheTrace, CoherenceController, MachineId, MachineType,
    Packet, RequestType, RubySystem, SimpleController, SimpleNetwork, TraceRecord, WriteMask,
};
use pretty_assertions::assert_eq;

use crate::common::mocks::controller::MockController;
use crate::common::mocks::network::MockNetwork;

const BLOCK: u64 = 64;

fn config(block: u64) -> RubyConfig {
    RubyConfig {
        block_size_bytes: block,
        ..RubyConfig::default()
    }
}

fn pattern(seed: u8) -> Vec<u8> {
    (0..BLOCK as u8).map(|i| i.wrapping_add(seed)).collect()
}

fn l1_with_lines() -> SimpleController {
    let mut l1 = SimpleController::new(MachineId::new(MachineType::L1Cache, 0), BLOCK);
    l1.set_line(0x40, AccessPermission::ReadWrite, pattern(1));
    l1.set_line(0x80, AccessPermission::ReadWrite, pattern(2));
    l1.set_line(0xC0, AccessPermission::ReadOnly, pattern(3));
    l1.set_line(0x100, AccessPermission::Busy, pattern(4));
    l1
}

/// One L1 and two interleaved directories.
fn two_directory_system() -> RubySystem {
    let mut sys = RubySystem::new(config(BLOCK)).unwrap();
    let _ = sys.register_abstract_controller(Box::new(l1_with_lines()));
    for num in 0..2 {
        let dir = SimpleController::directory(num, BLOCK).with_backing_store();
        let _ = sys.register_abstract_controller(Box::new(dir));
    }
    let net = SimpleNetwork::new(config(BLOCK).block_size_bits())
        .with_nodes(MachineType::Directory, 2);
    sys.register_network(Box::new(net));
    sys
}

fn memory_of(sys: &RubySystem, dir: usize, line: u64) -> Vec<u8> {
    let cntrl = sys
        .controller_by_id(MachineId::new(MachineType::Directory, dir))
        .unwrap();
    let mut pkt = Packet::read(line, BLOCK as usize);
    assert!(cntrl.functional_read(line, &mut pkt));
    pkt.data
}

#[test]
fn test_writeback_routes_to_home_directory() {
    let mut sys = two_directory_system();
    sys.mem_writeback().unwrap();

    assert_eq!(memory_of(&sys, 1, 0x40), pattern(1));
    assert_eq!(memory_of(&sys, 0, 0x80), pattern(2));
    assert_eq!(memory_of(&sys, 0, 0x40), vec![0; BLOCK as usize]);
    // Clean and transient lines are not written.
    assert_eq!(memory_of(&sys, 1, 0xC0), vec![0; BLOCK as usize]);
    assert_eq!(memory_of(&sys, 0, 0x100), vec![0; BLOCK as usize]);
}

#[test]
fn test_writeback_asks_network_for_home() {
    let mut sys = RubySystem::new(config(BLOCK)).unwrap();
    let mut l1 = SimpleController::new(MachineId::new(MachineType::L1Cache, 0), BLOCK);
    l1.set_line(0x1000, AccessPermission::ReadWrite, pattern(9));
    let _ = sys.register_abstract_controller(Box::new(l1));
    let dir = SimpleController::directory(3, BLOCK).with_backing_store();
    let _ = sys.register_abstract_controller(Box::new(dir));

    let mut net = MockNetwork::new();
    let _ = net
        .expect_address_to_node_id()
        .withf(|addr, kind| *addr == 0x1000 && *kind == MachineType::Directory)
        .times(1)
        .return_const(3usize);
    sys.register_network(Box::new(net));

    sys.mem_writeback().unwrap();
    assert_eq!(memory_of(&sys, 3, 0x1000), pattern(9));
}

#[test]
fn test_writeback_without_network_uses_directory_zero() {
    let mut sys = RubySystem::new(config(BLOCK)).unwrap();
    let mut l1 = SimpleController::new(MachineId::new(MachineType::L1Cache, 0), BLOCK);
    l1.set_line(0x40, AccessPermission::ReadWrite, pattern(5));
    let _ = sys.register_abstract_controller(Box::new(l1));
    let dir = SimpleController::directory(0, BLOCK).with_backing_store();
    let _ = sys.register_abstract_controller(Box::new(dir));

    sys.mem_writeback().unwrap();
    assert_eq!(memory_of(&sys, 0, 0x40), pattern(5));
}

#[test]
fn test_writeback_missing_directory() {
    let mut sys = RubySystem::new(config(BLOCK)).unwrap();
    let mut l1 = SimpleController::new(MachineId::new(MachineType::L1Cache, 0), BLOCK);
    l1.set_line(0x40, AccessPermission::ReadWrite, pattern(5));
    let _ = sys.register_abstract_controller(Box::new(l1));

    let mut net = MockNetwork::new();
    let _ = net.expect_address_to_node_id().return_const(5usize);
    sys.register_network(Box::new(net));

    assert_eq!(
        sys.mem_writeback(),
        Err(SimError::NoDirectory { line: 0x40, node: 5 })
    );
}

/// A controller whose trace holds a single store with `mask`.
fn scripted_store(mask: WriteMask) -> MockController {
    let record = TraceRecord {
        cntrl: 0,
        data_address: 0x200,
        pc: 0x8000_0000,
        kind: RequestType::Store,
        data: pattern(0x30),
        write_mask: mask,
    };
    let mut cntrl = MockController::new();
    let _ = cntrl
        .expect_machine_id()
        .return_const(MachineId::new(MachineType::L1Cache, 0));
    let _ = cntrl
        .expect_record_cache_trace()
        .times(1)
        .returning(move |_, recorder: &mut CacheRecorder| recorder.add_record(record.clone()));
    cntrl
}

#[test]
fn test_partial_store_writes_masked_bytes_only() {
    let mut mask = WriteMask::empty(BLOCK as usize);
    mask.set(2);
    mask.set(5);

    let mut sys = RubySystem::new(config(BLOCK)).unwrap();
    let _ = sys.register_abstract_controller(Box::new(scripted_store(mask)));
    let dir = SimpleController::directory(0, BLOCK).with_backing_store();
    let _ = sys.register_abstract_controller(Box::new(dir));

    sys.mem_writeback().unwrap();

    let data = pattern(0x30);
    let mut expected = vec![0; BLOCK as usize];
    expected[2] = data[2];
    expected[5] = data[5];
    assert_eq!(memory_of(&sys, 0, 0x200), expected);
}

#[test]
fn test_store_without_written_bytes_is_rejected() {
    let mut sys = RubySystem::new(config(BLOCK)).unwrap();
    let _ = sys.register_abstract_controller(Box::new(scripted_store(WriteMask::empty(
        BLOCK as usize,
    ))));
    let dir = SimpleController::directory(0, BLOCK).with_backing_store();
    let _ = sys.register_abstract_controller(Box::new(dir));

    assert_eq!(
        sys.mem_writeback(),
        Err(SimError::InvalidTraceRecord { line: 0x200 })
    );
}

#[test]
fn test_trace_requires_writeback() {
    let sys = two_directory_system();
    assert_eq!(sys.cache_trace(), Err(SimError::NoCacheTrace));
}

#[test]
fn test_trace_dropped_on_resume() {
    let mut sys = two_directory_system();
    sys.mem_writeback().unwrap();
    assert!(sys.cache_trace().is_ok());
    sys.drain_resume();
    assert_eq!(sys.cache_trace(), Err(SimError::NoCacheTrace));
}

#[test]
fn test_checkpoint_restore_with_smaller_blocks() {
    let mut sys = two_directory_system();
    sys.mem_writeback().unwrap();
    let trace = sys.cache_trace().unwrap();
    assert_eq!(trace.block_size_bytes, BLOCK);
    assert_eq!(trace.records.len(), 3);

    let text = serde_json::to_string(&trace).unwrap();
    let restored: CacheTrace = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, trace);

    let mut fresh = RubySystem::new(config(32)).unwrap();
    let l1 = SimpleController::new(MachineId::new(MachineType::L1Cache, 0), 32);
    let _ = fresh.register_abstract_controller(Box::new(l1));
    fresh.restore_cache_trace(restored);
    assert!(fresh.warmup_enabled());

    assert_eq!(fresh.startup(), 6);
    assert!(!fresh.warmup_enabled());

    let l1 = fresh.controller(0).unwrap();
    assert_eq!(l1.access_permission(0x40), AccessPermission::ReadWrite);
    assert_eq!(l1.access_permission(0x60), AccessPermission::ReadWrite);
    assert_eq!(l1.access_permission(0xE0), AccessPermission::ReadOnly);
    assert_eq!(l1.access_permission(0x100), AccessPermission::NotPresent);

    let mut pkt = Packet::read(0x60, 32);
    assert!(l1.functional_read(0x60, &mut pkt));
    assert_eq!(pkt.data, pattern(1)[32..].to_vec());

    assert_eq!(fresh.startup(), 0);
}

#[test]
fn test_startup_without_restore_replays_nothing() {
    let mut sys = two_directory_system();
    assert_eq!(sys.startup(), 0);
}
