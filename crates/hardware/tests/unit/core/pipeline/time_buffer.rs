//! # Time Buffer
//!
//! Stages write wire 0 and read wire -1, so a value becomes visible exactly one
//! advance after it was written.

use o3sim_core::core::pipeline::time_buffer::TimeBuffer;
use pretty_assertions::assert_eq;

/// A write shows up on the past wires as the buffer advances.
#[test]
fn write_visible_next_cycle() {
    let mut tb: TimeBuffer<u32> = TimeBuffer::new(2, 1);
    *tb.wire_mut(0) = 7;
    assert_eq!(*tb.wire(-1), 0);
    tb.advance();
    assert_eq!(*tb.wire(-1), 7);
    assert_eq!(*tb.wire(0), 0);
    tb.advance();
    assert_eq!(*tb.wire(-2), 7);
}

/// A value scheduled into the future becomes the current slot.
#[test]
fn future_slot_becomes_current() {
    let mut tb: TimeBuffer<u32> = TimeBuffer::new(1, 1);
    *tb.wire_mut(1) = 3;
    tb.advance();
    assert_eq!(*tb.wire(0), 3);
}

/// Values older than the history depth are reset to the default.
#[test]
fn history_expires() {
    let mut tb: TimeBuffer<u32> = TimeBuffer::new(1, 1);
    *tb.wire_mut(0) = 5;
    tb.advance();
    tb.advance();
    tb.advance();
    assert!(tb.slots().all(|v| *v == 0));
}

/// Flushing empties past and future slots alike.
#[test]
fn flush_clears_every_slot() {
    let mut tb: TimeBuffer<Vec<u8>> = TimeBuffer::new(3, 2);
    tb.wire_mut(-3).push(1);
    tb.wire_mut(2).push(2);
    tb.flush();
    assert!(tb.slots().all(Vec::is_empty));
}
