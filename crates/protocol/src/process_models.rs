//! Managed process state models.
//!
//! This module defines the structures for tracking the single child process
//! owned by the lifecycle controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the lifecycle state of the managed child process.
///
/// The state moves between these values as operator commands arrive:
/// Absent -> Running <-> Suspended -> Absent
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    /// No managed process exists.
    #[default]
    Absent,

    /// The managed process exists and is scheduled normally.
    Running,

    /// The managed process has been stopped with a stop notification.
    Suspended,
}

impl ProcessState {
    /// Whether a managed process currently exists.
    pub fn is_present(self) -> bool {
        !matches!(self, ProcessState::Absent)
    }
}

/// Snapshot of the managed process, as reported to the operator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManagedProcessInfo {
    /// OS process identifier of the managed child.
    pub pid: u32,

    /// Current lifecycle state.
    pub state: ProcessState,

    /// When the child was spawned.
    pub created_at: DateTime<Utc>,
}
