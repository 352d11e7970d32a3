//! # Simple Network

use o3sim_core::ruby::{MachineType, Network, Packet, SimpleNetwork};
use pretty_assertions::assert_eq;

/// Consecutive lines alternate between directories; other machine types sit on node 0.
#[test]
fn lines_interleave_across_directories() {
    let net = SimpleNetwork::new(6).with_nodes(MachineType::Directory, 2);
    assert_eq!(net.address_to_node_id(0x00, MachineType::Directory), 0);
    assert_eq!(net.address_to_node_id(0x40, MachineType::Directory), 1);
    assert_eq!(net.address_to_node_id(0x80, MachineType::Directory), 0);
    assert_eq!(net.address_to_node_id(0x40, MachineType::L2Cache), 0);
}

/// Messages in flight are visible to functional reads and writes.
#[test]
fn in_flight_read_and_write() {
    let mut net = SimpleNetwork::new(2);
    net.inject(0x8, vec![1, 2, 3, 4]);
    assert_eq!(net.functional_write(&Packet::write(0x9, &[7])), 1);
    let mut pkt = Packet::read(0x8, 4);
    assert!(net.functional_read(&mut pkt));
    assert_eq!(pkt.data, vec![1, 7, 3, 4]);
    assert!(!net.functional_read(&mut Packet::read(0x20, 1)));
}
