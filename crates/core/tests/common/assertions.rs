//! Custom assertion helpers for integration tests.

use crate::common::fixtures::{scheduler_state, wait_for};
use sp_protocol::ipc::Event;
use std::time::Duration;

/// Extract the process ID from the first ChildCreated event.
#[allow(dead_code)]
pub fn created_pid(events: &[Event]) -> Option<u32> {
    events.iter().find_map(|e| match e {
        Event::ChildCreated { pid, .. } => Some(*pid),
        _ => None,
    })
}

/// Count events matching `predicate`.
#[allow(dead_code)]
pub fn count_events<F>(events: &[Event], predicate: F) -> usize
where
    F: Fn(&Event) -> bool,
{
    events.iter().filter(|e| predicate(e)).count()
}

/// Assert that `pid` reaches the stopped scheduler state.
#[allow(dead_code)]
pub fn assert_stopped(pid: u32) {
    assert!(
        wait_for(Duration::from_secs(2), || scheduler_state(pid) == Some('T')),
        "process {pid} should be stopped, state is {:?}",
        scheduler_state(pid)
    );
}

/// Assert that `pid` exists and is not stopped.
#[allow(dead_code)]
pub fn assert_running(pid: u32) {
    assert!(
        wait_for(Duration::from_secs(2), || matches!(
            scheduler_state(pid),
            Some(state) if state != 'T' && state != 'Z'
        )),
        "process {pid} should be running, state is {:?}",
        scheduler_state(pid)
    );
}

/// Assert that `pid` no longer exists.
#[allow(dead_code)]
pub fn assert_gone(pid: u32) {
    assert!(
        wait_for(Duration::from_secs(2), || scheduler_state(pid).is_none()),
        "process {pid} should have been reaped"
    );
}
