//! Operator protocol for the lifecycle controller.
//!
//! This module defines the message types exchanged between the operator
//! prompt and the controller.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands typed by the operator
//! - `Event`: Outcomes reported back by the controller
//!
//! Keeping the controller on the far side of a channel lets the prompt render
//! outcomes however it likes, and lets tests observe them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands accepted by the lifecycle controller.
///
/// Uses tagged enum serialization:
/// ```json
/// { "type": "suspend" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Op {
    /// Spawn the managed child (`C`).
    Create,

    /// Deliver a stop notification to the managed child (`S`).
    Suspend,

    /// Deliver a continue notification to the managed child (`G`).
    Continue,

    /// Kill and reap the managed child, then stop the controller (`F`).
    Terminate,
}

impl Op {
    /// The single-character command the operator types for this op.
    pub fn key(self) -> char {
        match self {
            Op::Create => 'C',
            Op::Suspend => 'S',
            Op::Continue => 'G',
            Op::Terminate => 'F',
        }
    }

    /// Map a command character (case-insensitive) to its op.
    pub fn from_key(key: char) -> Option<Op> {
        match key.to_ascii_lowercase() {
            'c' => Some(Op::Create),
            's' => Some(Op::Suspend),
            'g' => Some(Op::Continue),
            'f' => Some(Op::Terminate),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Create => "create",
            Op::Suspend => "suspend",
            Op::Continue => "continue",
            Op::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

/// Why the controller is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShutdownReason {
    /// The operator issued `F`.
    Terminate,

    /// Standard input reached end-of-file.
    EndOfInput,

    /// The controller received an interrupt signal.
    Interrupted,
}

/// Events sent from the controller to the operator prompt.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "childSuspended",
///   "payload": { "pid": 4242 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The managed child was spawned at `created_at`.
    ChildCreated { pid: u32, created_at: DateTime<Utc> },

    /// `Create` was issued while a child already exists.
    ChildAlreadyExists { pid: u32 },

    /// The child could not be spawned; the controller keeps running.
    SpawnFailed { error: String },

    /// A lifecycle op needed a child but none exists.
    NoActiveChild { op: Op },

    /// A stop notification was delivered.
    ChildSuspended { pid: u32 },

    /// A continue notification was delivered.
    ChildResumed { pid: u32 },

    /// Delivering a notification to the child failed.
    SignalFailed {
        pid: u32,
        signal: String,
        error: String,
    },

    /// The child was killed and reaped by the controller.
    ChildTerminated { pid: u32 },

    /// The child exited on its own and has been reaped.
    ChildExited { pid: u32, code: Option<i32> },

    /// The operator typed something that is not a command.
    UnknownCommand { input: String },

    /// The controller is about to exit.
    ShuttingDown { reason: ShutdownReason },
}
