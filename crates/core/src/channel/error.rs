//! Error types for named channel operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for named channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur while creating or using a named channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The FIFO could not be created.
    #[error("Failed to create channel {path:?}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Something other than a FIFO already occupies the channel name.
    #[error("Cannot create channel {path:?}: a non-FIFO entry already exists")]
    AlreadyExists { path: PathBuf },

    /// Opening one end of the channel failed.
    #[error("Failed to open channel {path:?} for {direction}: {source}")]
    Open {
        path: PathBuf,
        direction: &'static str,
        source: std::io::Error,
    },

    /// Writing the payload failed.
    #[error("Failed to write to channel {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading the payload failed.
    #[error("Failed to read from channel {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
