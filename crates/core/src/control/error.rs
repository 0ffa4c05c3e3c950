//! Error types for the lifecycle controller.

use thiserror::Error;

/// Errors that stop the controller loop.
///
/// Operator mistakes and child failures are reported as events instead.
#[derive(Error, Debug)]
pub enum ControlError {
    /// Reading the next command failed.
    #[error("Failed to read command input: {0}")]
    Input(#[source] std::io::Error),
}

/// Type alias for Result with ControlError.
pub type ControlResult<T> = Result<T, ControlError>;
