//! # Fetch Stage

use o3sim_core::core::pipeline::stages::Fetch;
use o3sim_core::core::pipeline::traits::PipelineStage;

/// A running thread keeps fetch busy until it is drain-stalled.
#[test]
fn drain_stall_and_resume() {
    let mut fetch = Fetch::new(4);
    fetch.wake_from_quiesce(0);
    assert!(!fetch.is_drained());
    fetch.drain_stall(0);
    assert!(fetch.is_drained());
    fetch.drain_resume();
    assert!(!fetch.is_drain_stalled(0));
    assert!(!fetch.is_drained());
}

/// Threads that are not running never hold a drain back.
#[test]
fn idle_threads_count_as_drained() {
    let mut fetch = Fetch::new(4);
    assert!(fetch.is_drained());
    fetch.wake_from_quiesce(2);
    fetch.deactivate_thread(2);
    assert!(fetch.is_drained());
}
