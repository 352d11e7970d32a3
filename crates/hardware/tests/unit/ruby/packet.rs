//! # Packets

use o3sim_core::ruby::Packet;
use pretty_assertions::assert_eq;

/// A read inside a line copies from the matching offset.
#[test]
fn read_at_offset() {
    let block: Vec<u8> = (0..16).collect();
    let mut pkt = Packet::read(0x104, 4);
    assert!(pkt.read_from_block(0x100, &block));
    assert_eq!(pkt.data, vec![4, 5, 6, 7]);
}

/// A write running past the end of the line is clipped to it.
#[test]
fn write_clipped_to_line() {
    let mut block = vec![0u8; 8];
    let pkt = Packet::write(0x206, &[1, 2, 3, 4]);
    assert!(pkt.write_to_block(0x200, &mut block));
    assert_eq!(block, vec![0, 0, 0, 0, 0, 0, 1, 2]);
}

/// A packet for another line touches nothing.
#[test]
fn outside_line() {
    let mut pkt = Packet::read(0x40, 4);
    assert!(!pkt.read_from_block(0x80, &[0; 64]));
}
