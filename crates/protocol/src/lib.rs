//! # sp-protocol
//!
//! Core protocol definitions and data models for signal-pipeline.
//!
//! This crate defines all shared data structures used for:
//! - Settings parsing (optional TOML file, CLI overrides)
//! - Managed process state for the lifecycle controller
//! - Stage definitions and transforms for the pipeline
//! - Operator commands and controller events
//!
//! ## Modules
//!
//! - [`config_models`]: Settings for the controller and the pipeline
//! - [`pipeline_models`]: Transforms, stage definitions, stage states, verdicts
//! - [`process_models`]: Managed process state
//! - [`ipc`]: Operations and Events between the operator prompt and the controller
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde and chrono
//! - Independent compilation: No dependencies on other signal-pipeline crates

pub mod config_models;
pub mod ipc;
pub mod pipeline_models;
pub mod process_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use process_models::*;
