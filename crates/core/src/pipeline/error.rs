//! Error types for pipeline orchestration.

use crate::channel::ChannelError;
use crate::notify::NotifyError;
use thiserror::Error;

/// Result type for pipeline orchestration.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a pipeline run.
///
/// None of these are retried. Channels created before the failure are left
/// in place; workers already spawned are killed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A channel could not be created, opened, written or read.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A handler could not be installed, or a start notification could not
    /// be delivered.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// A stage worker could not be spawned.
    #[error("Failed to spawn stage {ordinal}: {source}")]
    Spawn {
        ordinal: usize,
        source: std::io::Error,
    },

    /// The worker program could not be located.
    #[error("Failed to locate the worker program: {0}")]
    WorkerProgram(std::io::Error),
}
