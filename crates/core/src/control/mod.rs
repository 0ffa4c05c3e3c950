//! Lifecycle controller for a single managed child process.
//!
//! The controller reads single-letter commands, applies them to the child it
//! owns and reports every outcome as an [`Event`](sp_protocol::ipc::Event):
//!
//! | Command | Effect |
//! |---|---|
//! | `C` | spawn the child unless one exists |
//! | `S` | stop the child |
//! | `G` | continue the child |
//! | `F` | kill and reap the child, then exit |
//!
//! End of input and an operator interrupt behave like `F`.

pub mod command;
pub mod controller;
pub mod error;
pub mod process;

pub use command::{parse_command, Input};
pub use controller::{drive, Flow, LifecycleController};
pub use error::{ControlError, ControlResult};
pub use process::ManagedProcess;
