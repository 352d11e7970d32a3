//! Functional access packets.
//!
//! A packet carries an address, a length and, for writes, the bytes to write.
//! Functional reads fill the packet from whichever copy of the line the arbiter
//! picks; functional writes copy the packet into every copy they reach.

/// Packet direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketCmd {
    /// Functional read.
    Read,
    /// Functional write.
    Write,
}

/// A functional memory access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Byte address.
    pub addr: u64,
    /// Access length in bytes.
    pub size: usize,
    /// Direction.
    pub cmd: PacketCmd,
    /// Read result or write payload, `size` bytes long.
    pub data: Vec<u8>,
}

impl Packet {
    /// Read of `size` bytes at `addr`.
    pub fn read(addr: u64, size: usize) -> Self {
        Self {
            addr,
            size,
            cmd: PacketCmd::Read,
            data: vec![0; size],
        }
    }

    /// Write of `data` at `addr`.
    pub fn write(addr: u64, data: &[u8]) -> Self {
        Self {
            addr,
            size: data.len(),
            cmd: PacketCmd::Write,
            data: data.to_vec(),
        }
    }

    /// Byte range of this packet within the line at `line_addr` of `block_len` bytes.
    fn span(&self, line_addr: u64, block_len: usize) -> Option<(usize, usize)> {
        let offset = usize::try_from(self.addr.checked_sub(line_addr)?).ok()?;
        if offset >= block_len {
            return None;
        }
        Some((offset, self.size.min(block_len - offset)))
    }

    /// Fills the packet from `block`, the contents of the line at `line_addr`.
    ///
    /// Returns false if the packet does not start inside the line.
    pub fn read_from_block(&mut self, line_addr: u64, block: &[u8]) -> bool {
        let Some((offset, len)) = self.span(line_addr, block.len()) else {
            return false;
        };
        self.data[..len].copy_from_slice(&block[offset..offset + len]);
        true
    }

    /// Copies the packet's payload into `block`, the contents of the line at `line_addr`.
    ///
    /// Returns false if the packet does not start inside the line.
    pub fn write_to_block(&self, line_addr: u64, block: &mut [u8]) -> bool {
        let Some((offset, len)) = self.span(line_addr, block.len()) else {
            return false;
        };
        block[offset..offset + len].copy_from_slice(&self.data[..len]);
        true
    }
}
