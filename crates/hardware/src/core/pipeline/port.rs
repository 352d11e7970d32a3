//! Cache ports of the core.
//!
//! Instead of a port class hierarchy, each port is a distinct type implementing
//! one small message-handling interface. It provides:
//! 1. **Requests:** `Request`, a fetch block or data access tagged with its thread.
//! 2. **Handler Interface:** `MessageHandler::handle`, answering `Accepted` or `Retry`.
//! 3. **Ports:** `IcachePort` and `DcachePort`, each with a per-cycle access budget that
//!    the core restores at the start of every tick.

use tracing::trace;

use crate::common::{SeqNum, ThreadId};

/// Kind of cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Instruction fetch block.
    Fetch,
    /// Data read.
    Read,
    /// Data write.
    Write,
}

/// A cache access request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Requesting thread.
    pub tid: ThreadId,
    /// Instruction on whose behalf the access is made, if any.
    pub seq: Option<SeqNum>,
    /// Target address.
    pub addr: u64,
    /// Access kind.
    pub kind: RequestKind,
}

/// Outcome of offering a request to a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortResponse {
    /// The request was taken.
    Accepted,
    /// The port is busy; offer the request again next cycle.
    Retry,
}

/// A component that accepts requests.
pub trait MessageHandler {
    /// Offers `req` to the handler.
    fn handle(&mut self, req: &Request) -> PortResponse;

    /// Restores the handler's per-cycle capacity.
    fn reset(&mut self);
}

/// Per-cycle access budget shared by both port kinds.
#[derive(Clone, Copy, Debug)]
struct Budget {
    limit: usize,
    used: usize,
    retries: u64,
}

impl Budget {
    const fn new(limit: usize) -> Self {
        Self {
            limit,
            used: 0,
            retries: 0,
        }
    }

    fn take(&mut self) -> PortResponse {
        if self.used < self.limit {
            self.used += 1;
            PortResponse::Accepted
        } else {
            self.retries += 1;
            PortResponse::Retry
        }
    }
}

/// Instruction cache port.
#[derive(Clone, Debug)]
pub struct IcachePort {
    budget: Budget,
}

impl IcachePort {
    /// Port allowing `ports` fetch blocks per cycle.
    pub const fn new(ports: usize) -> Self {
        Self {
            budget: Budget::new(ports),
        }
    }

    /// Requests refused so far.
    pub const fn retries(&self) -> u64 {
        self.budget.retries
    }
}

impl MessageHandler for IcachePort {
    fn handle(&mut self, req: &Request) -> PortResponse {
        debug_assert_eq!(req.kind, RequestKind::Fetch);
        let resp = self.budget.take();
        trace!(tid = req.tid, addr = req.addr, ?resp, "icache");
        resp
    }

    fn reset(&mut self) {
        self.budget.used = 0;
    }
}

/// Data cache port.
#[derive(Clone, Debug)]
pub struct DcachePort {
    budget: Budget,
}

impl DcachePort {
    /// Port allowing `ports` data accesses per cycle.
    pub const fn new(ports: usize) -> Self {
        Self {
            budget: Budget::new(ports),
        }
    }

    /// Requests refused so far.
    pub const fn retries(&self) -> u64 {
        self.budget.retries
    }
}

impl MessageHandler for DcachePort {
    fn handle(&mut self, req: &Request) -> PortResponse {
        debug_assert_ne!(req.kind, RequestKind::Fetch);
        let resp = self.budget.take();
        trace!(tid = req.tid, sn = ?req.seq, addr = req.addr, ?resp, "dcache");
        resp
    }

    fn reset(&mut self) {
        self.budget.used = 0;
    }
}
