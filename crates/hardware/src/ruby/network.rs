//! Interconnect network.
//!
//! The arbiter only needs two things from the network: access to messages in
//! flight, and the mapping from a line to the controller that owns it.

use super::MachineType;
use super::packet::Packet;

/// Network connecting the coherence controllers.
pub trait Network {
    /// Reads `pkt` from a message in flight. Returns true if one carried the line.
    fn functional_read(&mut self, pkt: &mut Packet) -> bool;

    /// Writes `pkt` into every message in flight for its line. Returns the number written.
    fn functional_write(&mut self, pkt: &Packet) -> u32;

    /// Index, among controllers of `kind`, of the one that owns `addr`.
    fn address_to_node_id(&self, addr: u64, kind: MachineType) -> usize;
}

/// Network holding in-flight messages in a list, interleaving lines across nodes.
#[derive(Clone, Debug)]
pub struct SimpleNetwork {
    block_size_bits: u32,
    nodes: Vec<(MachineType, usize)>,
    in_flight: Vec<(u64, Vec<u8>)>,
}

impl SimpleNetwork {
    /// Creates an empty network for lines of `2^block_size_bits` bytes.
    pub const fn new(block_size_bits: u32) -> Self {
        Self {
            block_size_bits,
            nodes: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    /// Sets the number of controllers of `kind` that lines are interleaved across.
    #[must_use]
    pub fn with_nodes(mut self, kind: MachineType, count: usize) -> Self {
        self.nodes.retain(|(k, _)| *k != kind);
        self.nodes.push((kind, count));
        self
    }

    /// Puts a message carrying `data` for `line` in flight.
    pub fn inject(&mut self, line: u64, data: Vec<u8>) {
        self.in_flight.push((line, data));
    }

    fn line_of(&self, addr: u64) -> u64 {
        (addr >> self.block_size_bits) << self.block_size_bits
    }
}

impl Network for SimpleNetwork {
    fn functional_read(&mut self, pkt: &mut Packet) -> bool {
        let line = self.line_of(pkt.addr);
        self.in_flight
            .iter()
            .find(|(addr, _)| *addr == line)
            .is_some_and(|(addr, data)| pkt.read_from_block(*addr, data))
    }

    fn functional_write(&mut self, pkt: &Packet) -> u32 {
        let line = self.line_of(pkt.addr);
        let mut written = 0;
        for (addr, data) in self.in_flight.iter_mut().filter(|(a, _)| *a == line) {
            written += u32::from(pkt.write_to_block(*addr, data));
        }
        written
    }

    fn address_to_node_id(&self, addr: u64, kind: MachineType) -> usize {
        let count = self
            .nodes
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(1, |(_, n)| (*n).max(1));
        ((addr >> self.block_size_bits) % count as u64) as usize
    }
}
