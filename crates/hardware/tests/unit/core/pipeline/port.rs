//! # Cache Ports

use o3sim_core::core::pipeline::port::{
    DcachePort, IcachePort, MessageHandler, PortResponse, Request, RequestKind,
};
use pretty_assertions::assert_eq;

fn read(addr: u64) -> Request {
    Request {
        tid: 0,
        seq: Some(1),
        addr,
        kind: RequestKind::Read,
    }
}

/// Requests beyond the per-cycle budget are told to retry until the next reset.
#[test]
fn budget_exhaustion_and_reset() {
    let mut port = DcachePort::new(2);
    assert_eq!(port.handle(&read(0)), PortResponse::Accepted);
    assert_eq!(port.handle(&read(8)), PortResponse::Accepted);
    assert_eq!(port.handle(&read(16)), PortResponse::Retry);
    assert_eq!(port.retries(), 1);

    port.reset();
    assert_eq!(port.handle(&read(16)), PortResponse::Accepted);
}

/// One instruction cache port serves one fetch block per cycle.
#[test]
fn icache_single_block() {
    let mut port = IcachePort::new(1);
    let req = Request {
        tid: 1,
        seq: None,
        addr: 0x40,
        kind: RequestKind::Fetch,
    };
    assert_eq!(port.handle(&req), PortResponse::Accepted);
    assert_eq!(port.handle(&req), PortResponse::Retry);
}
