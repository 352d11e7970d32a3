//! # Event Queue

use o3sim_core::sim::event::{CpuEvent, EventQueue};
use pretty_assertions::assert_eq;

/// Events are serviced in time order and advance the current tick.
#[test]
fn services_in_time_order() {
    let mut q = EventQueue::new();
    q.schedule(CpuEvent::ThreadExit, 20);
    q.schedule(CpuEvent::Tick, 10);
    assert_eq!(q.service_one(), Some((10, CpuEvent::Tick)));
    assert_eq!(q.cur_tick(), 10);
    assert_eq!(q.service_one(), Some((20, CpuEvent::ThreadExit)));
    assert_eq!(q.service_one(), None);
}

/// A descheduled event leaves nothing to service.
#[test]
fn deschedule_skips_stale_entry() {
    let mut q = EventQueue::new();
    q.schedule(CpuEvent::Tick, 5);
    q.deschedule(CpuEvent::Tick);
    assert!(!q.is_scheduled(CpuEvent::Tick));
    assert!(q.is_empty());
    assert_eq!(q.service_one(), None);
}

/// Scheduling a pending event again moves it instead of duplicating it.
#[test]
fn reschedule_replaces() {
    let mut q = EventQueue::new();
    q.schedule(CpuEvent::Tick, 50);
    q.schedule(CpuEvent::Tick, 7);
    assert_eq!(q.when(CpuEvent::Tick), Some(7));
    assert_eq!(q.service_one(), Some((7, CpuEvent::Tick)));
    assert_eq!(q.service_one(), None);
}

/// An event scheduled in the past fires at the current tick.
#[test]
fn past_times_clamp() {
    let mut q = EventQueue::new();
    q.warp_to(100);
    q.schedule(CpuEvent::Tick, 3);
    assert_eq!(q.service_one(), Some((100, CpuEvent::Tick)));
}
