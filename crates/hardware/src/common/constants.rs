//! System-wide constants.

/// Maximum hardware threads per core.
pub const MAX_THREADS: usize = 8;

/// First sequence number handed out; zero means "before any instruction".
pub const FIRST_SEQ_NUM: u64 = 1;

/// Ticks per nanosecond at the default 1 ps tick resolution.
pub const TICKS_PER_NS: u64 = 1000;
