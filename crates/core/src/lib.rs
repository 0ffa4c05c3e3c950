//! # sp-core
//!
//! Process coordination primitives and the two tools built on them.
//!
//! This crate provides:
//! - Named channels backed by POSIX FIFOs
//! - Signal-driven notification flags and a race-free wait primitive
//! - The pipeline stage worker and the orchestrator that sequences stages
//! - The lifecycle controller for a single managed child process
//! - Settings loading
//!
//! ## Modules
//!
//! - [`channel`]: Rendezvous named channels
//! - [`notify`]: Notification flags, waiting and sending
//! - [`stage`]: Pipeline worker state machine
//! - [`pipeline`]: Pipeline orchestrator
//! - [`control`]: Lifecycle controller
//! - [`config`]: Settings loading and validation

pub mod channel;
pub mod config;
pub mod control;
pub mod notify;
pub mod pipeline;
pub mod stage;
